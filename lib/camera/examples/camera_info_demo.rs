use camera::CaptureBackend;

fn main() {
    #[cfg(feature = "native")]
    let backend: Box<dyn CaptureBackend> = Box::new(camera::NativeBackend::default());

    #[cfg(not(feature = "native"))]
    let backend: Box<dyn CaptureBackend> = Box::new(camera::SyntheticBackend::default());

    let cameras = backend.devices();
    println!("Found {} working {} cameras", cameras.len(), backend.name());

    for cam in &cameras {
        println!("  - {:?}", cam);
    }
}
