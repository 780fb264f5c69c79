//! Text pool churn: heavy rewrite traffic against a small arena, relying on
//! compaction to reclaim abandoned ranges. Every node must read back its
//! most recent write at all times.

use weft_tui::region::{RegionConfig, COMPONENT_TEXT};
use weft_tui::SharedRegion;

const POOL_SIZE: usize = 100 * 1024;
const NODES: usize = 50;

fn pool_region() -> SharedRegion {
    SharedRegion::create(RegionConfig {
        max_nodes: 64,
        text_pool_size: POOL_SIZE,
        max_viewport_width: 40,
        max_viewport_height: 12,
        event_ring_capacity: 8,
    })
    .unwrap()
}

fn payload(node: usize, round: usize, len: usize) -> String {
    let tag = format!("n{node:02}r{round:04}:");
    let mut s = tag;
    while s.len() < len {
        s.push(char::from(b'a' + (node % 26) as u8));
    }
    s.truncate(len);
    s
}

#[test]
fn alternating_writes_survive_compaction() {
    let region = pool_region();
    let nodes: Vec<usize> = (0..NODES)
        .map(|_| {
            let n = region.alloc().unwrap();
            region.set_component_type(n, COMPONENT_TEXT);
            n
        })
        .collect();

    // 500 rounds alternating short and long strings. Total bytes written far
    // exceed the pool, so compaction must run many times.
    let mut expected = vec![String::new(); NODES];
    for round in 0..500 {
        for (i, &node) in nodes.iter().enumerate() {
            let len = if (round + i) % 2 == 0 { 2 } else { 55 };
            let text = payload(i, round, len);
            region.set_text(node, &text).expect("live bytes fit the pool");
            expected[i] = text;
        }
        if round % 50 == 0 {
            for (i, &node) in nodes.iter().enumerate() {
                assert_eq!(region.text(node), expected[i], "round {round}, node {i}");
            }
        }
    }

    // Grow every node to 100 bytes; 50 × 100 live bytes still fit.
    for round in 500..600 {
        for (i, &node) in nodes.iter().enumerate() {
            let text = payload(i, round, 100);
            region.set_text(node, &text).expect("live bytes fit the pool");
            expected[i] = text;
        }
    }
    for (i, &node) in nodes.iter().enumerate() {
        assert_eq!(region.text(node), expected[i]);
    }

    // After one final explicit compaction the pool holds exactly the live
    // bytes and every reference still resolves.
    region.compact();
    assert_eq!(region.text_pool_used(), NODES * 100);
    for (i, &node) in nodes.iter().enumerate() {
        assert_eq!(region.text(node), expected[i]);
    }
}

#[test]
fn oversized_write_fails_without_corrupting_live_text() {
    let region = pool_region();
    let keeper = region.alloc().unwrap();
    region.set_component_type(keeper, COMPONENT_TEXT);
    region.set_text(keeper, "important").unwrap();

    let big = "x".repeat(POOL_SIZE);
    assert!(region.set_text(keeper, &big).is_err());
    assert_eq!(region.text(keeper), "important");
}
