fn main() {
    #[cfg(feature = "cli")]
    vcdelta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("vcdelta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
