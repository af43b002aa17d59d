use std::io::Cursor;

use honggfuzz::fuzz;
use shredscope::{build_index, detect_readiness, load_block, track, BucketWidth, LineWindow};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Ok(index) = build_index(Cursor::new(data), LineWindow::all()) else {
                return;
            };
            for (block_id, range) in index.iter() {
                let events = load_block(Cursor::new(data), range, block_id, BucketWidth::MICROSECOND)
                    .expect("indexed range must be readable");
                let progress = track(&events);
                let readiness = detect_readiness(&events);
                for ts in readiness.ready.values() {
                    assert!(progress.timelines.values().any(|t| t.count_at(*ts).is_some()));
                }
            }
        });
    }
}
