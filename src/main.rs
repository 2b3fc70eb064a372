fn main() {
    if let Err(err) = linmap_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
