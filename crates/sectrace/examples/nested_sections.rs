//! Demo of a render loop instrumented with nested sections.

use std::sync::Arc;
use std::thread;

use sectrace::SectionTracker;

fn measure(tracker: &SectionTracker) -> sectrace::Result<()> {
    let _measure = tracker.section("measure")?;
    tracker.in_section("layout_children", || {
        // Simulate some work
        thread::sleep(std::time::Duration::from_millis(1));
    })
}

fn draw_frame(tracker: &SectionTracker, frame: usize) -> sectrace::Result<()> {
    let name = format!("frame-{}", frame);
    let _frame = tracker.section(name.as_str())?;
    measure(tracker)?;
    tracker.in_section("draw", || ())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let tracker = Arc::new(SectionTracker::new());
    tracker.set_strict_mode(true);

    for frame in 0..2 {
        draw_frame(&tracker, frame)?;
    }

    // A background thread shares the same stack.
    let background = Arc::clone(&tracker);
    thread::spawn(move || background.in_section("decode_image", || ()))
        .join()
        .map_err(|_| "decoder thread panicked")??;

    println!("{}", tracker.snapshot());

    // Ending with nothing active fails in strict mode...
    if let Err(e) = tracker.end_section() {
        println!("\nstrict: {}", e);
    }

    // ...and only warns after a reset.
    tracker.reset();
    tracker.end_section()?;
    println!("lenient: ok, history cleared = {}", tracker.completed_count() == 0);

    Ok(())
}
