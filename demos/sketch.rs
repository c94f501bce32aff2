// Headless sketching session: capture a line and a point, print what the
// engine emitted and what ended up in the scene.

use sketchplot::{
    register_builtins, EventFilter, EventKind, MemoryScene, PlotController, PointerEvent,
    SchemeRegistry,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchplot=debug".into()),
        )
        .init();

    let mut registry = SchemeRegistry::new();
    register_builtins(&mut registry);
    let mut controller = PlotController::new(registry);
    let mut scene = MemoryScene::new();

    // Watch lifecycle and capture events
    let events = controller.events().subscribe(EventFilter::only(
        EventKind::PRODUCT_STARTED
            | EventKind::POINT_APPENDED
            | EventKind::PRODUCT_COMPLETED,
    ));

    // Draw a two-point line: two clicks, with a hover in between
    controller.execute("LineString", &mut scene).expect("builtin scheme");
    controller.handle_pointer(PointerEvent::left_click(10.0, 10.0), &mut scene);
    frame(&mut controller, &mut scene);
    controller.handle_pointer(PointerEvent::moved(80.0, 40.0), &mut scene);
    frame(&mut controller, &mut scene);
    controller.handle_pointer(PointerEvent::left_click(80.0, 40.0), &mut scene);
    frame(&mut controller, &mut scene);

    // Drop a marker next to it
    controller.execute("Point", &mut scene).expect("builtin scheme");
    controller.handle_pointer(PointerEvent::left_click(120.0, 20.0), &mut scene);
    frame(&mut controller, &mut scene);

    for event in events.try_iter() {
        let product = event
            .product
            .as_ref()
            .map(|m| m.scheme_type.as_str())
            .unwrap_or("?");
        println!("[{:.3}s] {} ({product})", event.timestamp, event.kinds);
    }

    println!(
        "scene:\n{}",
        serde_json::to_string_pretty(scene.drawables()).expect("drawables serialize")
    );
}

fn frame(controller: &mut PlotController, scene: &mut MemoryScene) {
    // a real host calls this from its render loop; the grace window for
    // double clicks is a few milliseconds
    std::thread::sleep(std::time::Duration::from_millis(10));
    controller.on_frame(scene);
}
