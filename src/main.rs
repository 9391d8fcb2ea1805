fn main() {
    #[cfg(feature = "cli")]
    hexandtabler::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("hexandtabler: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
