// Capture a polygon with a forced double-click completion, then edit it:
// drag a vertex handle and nudge it with the keyboard.

use sketchplot::{
    register_builtins, ArrowKey, KeyEvent, MemoryScene, PlotController, PointerEvent,
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

    let id = controller.execute("Polygon", &mut scene).expect("builtin scheme");
    for (x, y) in [(0.0, 0.0), (60.0, 0.0), (60.0, 60.0)] {
        controller.handle_pointer(PointerEvent::moved(x, y), &mut scene);
        controller.handle_pointer(PointerEvent::left_click(x, y), &mut scene);
        frame(&mut controller, &mut scene);
    }
    // fourth corner via double click: appends and closes the ring
    controller.handle_pointer(PointerEvent::double_click(0.0, 60.0), &mut scene);
    frame(&mut controller, &mut scene);
    println!("captured: {:?}", controller.product(id).unwrap().positions());

    // drag the second vertex outward through its control handle
    controller.handle_pointer(PointerEvent::left_down(60.0, 0.0), &mut scene);
    controller.handle_pointer(PointerEvent::moved(90.0, -10.0), &mut scene);
    controller.handle_pointer(PointerEvent::left_up(90.0, -10.0), &mut scene);
    // input stacks deliver a click after pointer-up; the engine swallows it
    controller.handle_pointer(PointerEvent::left_click(90.0, -10.0), &mut scene);
    frame(&mut controller, &mut scene);

    // select the first vertex and nudge it north twice
    controller.handle_pointer(PointerEvent::left_click(0.0, 0.0), &mut scene);
    frame(&mut controller, &mut scene);
    controller.handle_key(KeyEvent::new(ArrowKey::Up), &mut scene);
    controller.handle_key(KeyEvent::new(ArrowKey::Up), &mut scene);
    frame(&mut controller, &mut scene);

    println!("edited: {:?}", controller.product(id).unwrap().positions());
    println!(
        "scene:\n{}",
        serde_json::to_string_pretty(scene.drawables()).expect("drawables serialize")
    );
}

fn frame(controller: &mut PlotController, scene: &mut MemoryScene) {
    std::thread::sleep(std::time::Duration::from_millis(10));
    controller.on_frame(scene);
}
