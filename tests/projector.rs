use std::collections::BTreeMap;

use shredscope::{
    detect_readiness, project, track, Channel, MismatchPolicy, ReadyPoint, ReceiptEvent,
    ShredscopeError, Timestamp,
};

fn shred(fec_set_id: u32, fragment_id: u32, ts: i64) -> ReceiptEvent {
    ReceiptEvent {
        channel: Channel::Propagation,
        block_id: 1,
        fragment_id,
        fec_set_id,
        declared_data_fragments: 2,
        declared_set_size: 4,
        timestamp: Some(Timestamp::from_micros(ts)),
    }
}

#[test]
fn ready_sets_map_to_their_timeline_counts() {
    let events = vec![
        shred(0, 0, 0),
        shred(0, 1, 1),
        shred(0, 0, 2),
        shred(1, 0, 5),
        shred(1, 1, 5),
        shred(1, 2, 5),
    ];
    let progress = track(&events);
    let readiness = detect_readiness(&events);
    let points = project(&readiness.ready, &progress.timelines, MismatchPolicy::Fail).unwrap();
    assert_eq!(
        points,
        vec![
            ReadyPoint { fec_set_id: 0, timestamp: Timestamp::from_micros(1), cumulative: 2 },
            ReadyPoint { fec_set_id: 1, timestamp: Timestamp::from_micros(5), cumulative: 3 },
        ]
    );
}

#[test]
fn mismatch_fails_by_default() {
    let progress = track(&[shred(0, 0, 10), shred(0, 1, 20)]);
    let mut ready = BTreeMap::new();
    ready.insert(0, Timestamp::from_micros(15));
    let err = project(&ready, &progress.timelines, MismatchPolicy::default()).unwrap_err();
    match err {
        ShredscopeError::ProjectionMismatch { fec_set_id, timestamp } => {
            assert_eq!(fec_set_id, 0);
            assert_eq!(timestamp, Timestamp::from_micros(15));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn mismatch_can_be_dropped() {
    let progress = track(&[shred(0, 0, 10), shred(0, 1, 20)]);
    let mut ready = BTreeMap::new();
    ready.insert(0, Timestamp::from_micros(20));
    ready.insert(1, Timestamp::from_micros(20));
    let points = project(&ready, &progress.timelines, MismatchPolicy::Drop).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].cumulative, 2);
}

#[test]
fn policy_parses_from_cli_text() {
    assert_eq!("fail".parse::<MismatchPolicy>(), Ok(MismatchPolicy::Fail));
    assert_eq!("DROP".parse::<MismatchPolicy>(), Ok(MismatchPolicy::Drop));
    assert!("ignore".parse::<MismatchPolicy>().is_err());
    assert_eq!(MismatchPolicy::Drop.to_string(), "drop");
}
