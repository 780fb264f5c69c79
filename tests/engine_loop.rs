//! Threaded engine tests: a producer thread writing the region while the
//! real watcher/renderer thread runs headless.
//!
//! Covers wake coalescing (a burst of wakes yields between 1 and N frames),
//! the publish ordering guarantee (write → wake → spin on render_count sees
//! the writes), and cooperative shutdown.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use weft_tui::region::{self, RegionConfig};
use weft_tui::renderer::Frame;
use weft_tui::types::Rgba;
use weft_tui::{Engine, EngineConfig, SharedRegion};

fn leaked_region() -> &'static SharedRegion {
    Box::leak(Box::new(
        SharedRegion::create(RegionConfig {
            max_nodes: 64,
            text_pool_size: 8 * 1024,
            max_viewport_width: 100,
            max_viewport_height: 30,
            event_ring_capacity: 32,
        })
        .unwrap(),
    ))
}

fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

#[test]
fn write_wake_spin_sees_the_frame() {
    let region = leaked_region();
    region.set_terminal_size(80, 24);
    let engine = Engine::start(region, EngineConfig::headless(Box::new(std::io::sink()))).unwrap();

    let root = region.alloc().unwrap();
    region.set_layout_f32(root, region::F_WIDTH, 40.0);
    region.set_layout_f32(root, region::F_HEIGHT, 10.0);
    region.set_color(root, region::C_BG_COLOR, Rgba::BLUE.pack());

    let seen = region.render_count().load(Ordering::Acquire);
    region.wake();
    let after = region.wait_for_frame(seen);
    assert!(after > seen);

    // A frame carrying the writes lands once the wake word drains: the
    // computed fields and the emitted framebuffer both reflect them.
    assert!(wait_until(Duration::from_secs(5), || {
        region.wake_word().load(Ordering::Acquire) == 0
            && region.computed_width(root) == 40.0
            && {
                let emitted = region.emitted_parity() as usize;
                let frame = Frame::in_region(region, emitted, 80, 24);
                frame.get(5, 5).unwrap().bg_rgba() == Rgba::BLUE
            }
    }));

    engine.stop();
}

#[test]
fn burst_of_wakes_coalesces() {
    let region = leaked_region();
    region.set_terminal_size(60, 20);
    let engine = Engine::start(region, EngineConfig::headless(Box::new(std::io::sink()))).unwrap();

    let node = region.alloc().unwrap();
    region.set_layout_f32(node, region::F_WIDTH, 10.0);
    region.set_layout_f32(node, region::F_HEIGHT, 3.0);
    region.wake();
    region.wait_for_frame(0);

    let before = region.render_count().load(Ordering::Acquire);

    // 1000 updates in a tight loop, each with the full wake sequence.
    let colors: Vec<u32> = (0..1000u32)
        .map(|i| Rgba::new((i % 256) as u8, ((i * 7) % 256) as u8, ((i * 13) % 256) as u8, 255).pack())
        .collect();
    for &packed in &colors {
        region.set_color(node, region::C_BG_COLOR, packed);
        region.wake();
    }

    // Drain: the wake word clears and the final framebuffer reflects the
    // last write only.
    let last = *colors.last().unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        region.wake_word().load(Ordering::Acquire) == 0 && {
            let emitted = region.emitted_parity() as usize;
            let frame = Frame::in_region(region, emitted, 60, 20);
            frame.get(1, 1).unwrap().bg == last
        }
    }));

    let frames = region.render_count().load(Ordering::Acquire) - before;
    assert!(frames >= 1, "a pending wake must produce at least one frame");
    assert!(frames <= 1000, "never more frames than wakes, got {frames}");

    engine.stop();
}

#[test]
fn stop_joins_and_freezes_the_counter() {
    let region = leaked_region();
    region.set_terminal_size(40, 12);
    let engine = Engine::start(region, EngineConfig::headless(Box::new(std::io::sink()))).unwrap();

    let node = region.alloc().unwrap();
    region.set_layout_f32(node, region::F_WIDTH, 5.0);
    region.set_layout_f32(node, region::F_HEIGHT, 2.0);
    region.wake();
    region.wait_for_frame(0);

    engine.stop();
    assert!(!engine.is_running());
    assert!(region.exit_requested());

    // Wakes after shutdown no longer drive frames.
    let frozen = region.render_count().load(Ordering::Acquire);
    region.wake();
    assert!(!wait_until(Duration::from_millis(200), || {
        region.render_count().load(Ordering::Acquire) != frozen
    }));
}

#[test]
fn producer_thread_and_renderer_share_the_region() {
    let region = leaked_region();
    region.set_terminal_size(60, 20);
    let engine = Engine::start(region, EngineConfig::headless(Box::new(std::io::sink()))).unwrap();

    let root = region.alloc().unwrap();
    region.set_layout_f32(root, region::F_WIDTH, 60.0);
    region.set_layout_f32(root, region::F_HEIGHT, 20.0);

    let producer = std::thread::spawn(move || {
        for round in 0..50u64 {
            let seen = region.render_count().load(Ordering::Acquire);
            region.set_layout_f32(root, region::F_HEIGHT, (round % 20 + 1) as f32);
            region.wake();
            region.wait_for_frame(seen);
        }
    });
    producer.join().unwrap();

    assert!(region.render_count().load(Ordering::Acquire) >= 50);
    // The final write lands once the last pending wake drains.
    assert!(wait_until(Duration::from_secs(5), || {
        region.wake_word().load(Ordering::Acquire) == 0 && region.computed_height(root) == 18.0 // 49 % 20 + 1
    }));
    engine.stop();
}
