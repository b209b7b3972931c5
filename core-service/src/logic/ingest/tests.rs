//! Pipeline tests against a live context

use std::sync::Arc;

use serde_json::json;
use tempfile::{tempdir, TempDir};
use tokio::sync::watch;

use super::*;
use crate::constants::DataPaths;
use crate::logic::broadcast::ServerMessage;
use crate::logic::features::CodecError;
use crate::logic::model::Room;
use crate::logic::state::AppContext;
use crate::logic::testing::{home_anchors, tiny_model};
use crate::logic::training::{ForestFitter, TrainingState};

fn context(with_model: bool) -> (TempDir, Arc<AppContext>) {
    let dir = tempdir().unwrap();
    let ctx = AppContext::new(
        home_anchors(),
        DataPaths::in_dir(dir.path()),
        Arc::new(ForestFitter::default()),
    );
    if with_model {
        ctx.engine.swap(tiny_model(&ctx.anchors));
    }
    ctx.devices.register(["ble-1", "ble-2"]);
    (dir, Arc::new(ctx))
}

fn update(device: &str, bedroom: f64, living: f64, living2: f64) -> String {
    json!({
        "entity": {
            "id": device,
            "state": "bedroom",
            "measuredValues": {
                "Bedroom": { "rssi": bedroom, "measuredPower": -59 },
                "Living Room": { "rssi": living, "measuredPower": -59 },
                "Living Room 2": { "rssi": living2, "measuredPower": -59 }
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_prediction_is_broadcast() {
    let (_dir, ctx) = context(true);
    let mut sub = ctx.hub.subscribe();
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));

    let outcome = pipeline.handle_text(&update("ble-1", -58.0, -82.0, -80.0));

    assert_eq!(
        outcome,
        Outcome::Handled {
            device_id: "ble-1".into(),
            room: Some(Room::Bedroom),
            recorded: None,
        }
    );
    let msg = sub.receiver.try_recv().unwrap();
    assert_eq!(*msg, ServerMessage::room("ble-1", Room::Bedroom, Some("bedroom".into())));
}

#[tokio::test]
async fn test_training_drops_events() {
    let (_dir, ctx) = context(true);
    let mut sub = ctx.hub.subscribe();
    let (state_tx, state_rx) = watch::channel(TrainingState::Training);
    let pipeline = IngestPipeline::with_state(Arc::clone(&ctx), state_rx);

    ctx.set_room("ble-1", "bedroom").unwrap();
    ctx.apply_gathering("ble-1", crate::GatheringAction::New).unwrap();

    for _ in 0..3 {
        let outcome = pipeline.handle_text(&update("ble-1", -58.0, -82.0, -80.0));
        assert_eq!(outcome, Outcome::Dropped(DropReason::Training));
    }
    assert!(sub.receiver.try_recv().is_err());
    assert_eq!(ctx.recorder.row_count(), 0);

    // Nothing replayed once idle
    state_tx.send_replace(TrainingState::Idle);
    assert!(sub.receiver.try_recv().is_err());
    assert!(matches!(
        pipeline.handle_text(&update("ble-1", -58.0, -82.0, -80.0)),
        Outcome::Handled { .. }
    ));
    assert!(sub.receiver.try_recv().is_ok());
}

#[tokio::test]
async fn test_unknown_device_dropped() {
    let (_dir, ctx) = context(true);
    let mut sub = ctx.hub.subscribe();
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));

    let outcome = pipeline.handle_text(&update("ble-9", -58.0, -82.0, -80.0));

    assert_eq!(outcome, Outcome::Dropped(DropReason::UnknownDevice));
    assert!(sub.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_gathering_appends_user_label() {
    let (_dir, ctx) = context(true);
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));
    ctx.set_room("ble-1", "bedroom").unwrap();
    ctx.apply_gathering("ble-1", crate::GatheringAction::New).unwrap();

    // Readings look like the living room; the row still carries "bedroom"
    let outcome = pipeline.handle_text(&update("ble-1", -82.0, -58.0, -60.0));

    assert_eq!(
        outcome,
        Outcome::Handled {
            device_id: "ble-1".into(),
            room: Some(Room::LivingRoom),
            recorded: Some(1),
        }
    );
    let dataset = ctx.recorder.snapshot().unwrap();
    assert_eq!(dataset.len(), 1);
    let row = &dataset.rows()[0];
    assert_eq!(row.device_id, "ble-1");
    assert_eq!(row.room, Room::Bedroom);
    assert_eq!(row.features, vec![-82.0, -58.0, -60.0]);

    // Another device without a room is never recorded
    ctx.apply_gathering("ble-2", crate::GatheringAction::Append).ok();
    pipeline.handle_text(&update("ble-2", -82.0, -58.0, -60.0));
    assert_eq!(ctx.recorder.row_count(), 1);
}

#[tokio::test]
async fn test_records_without_model() {
    let (_dir, ctx) = context(false);
    let mut sub = ctx.hub.subscribe();
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));
    ctx.set_room("ble-1", "living room").unwrap();
    ctx.apply_gathering("ble-1", crate::GatheringAction::New).unwrap();

    let outcome = pipeline.handle_text(&update("ble-1", -82.0, -58.0, -60.0));

    assert_eq!(
        outcome,
        Outcome::Handled {
            device_id: "ble-1".into(),
            room: None,
            recorded: Some(1),
        }
    );
    assert!(sub.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_anchor_drops_single_event() {
    let (_dir, ctx) = context(true);
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));
    let partial = json!({
        "entity": {
            "id": "ble-1",
            "measuredValues": {
                "Bedroom": { "rssi": -60 },
                "Living Room": { "rssi": -80 }
            }
        }
    })
    .to_string();

    assert_eq!(
        pipeline.handle_text(&partial),
        Outcome::Dropped(DropReason::Codec(CodecError::MissingAnchorReading(
            "living-room-2".into()
        )))
    );
    // The next well-formed event still goes through
    assert!(matches!(
        pipeline.handle_text(&update("ble-1", -58.0, -82.0, -80.0)),
        Outcome::Handled { room: Some(Room::Bedroom), .. }
    ));
}

#[tokio::test]
async fn test_non_entity_messages() {
    let (_dir, ctx) = context(true);
    let pipeline = IngestPipeline::new(Arc::clone(&ctx));

    assert_eq!(pipeline.handle_text(r#"{"result": "ok"}"#), Outcome::Ignored);
    assert!(matches!(pipeline.handle_text("{"), Outcome::Dropped(DropReason::Malformed(_))));
}
