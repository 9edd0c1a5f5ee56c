fn main() {
    #[cfg(feature = "cli")]
    metagz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("metagz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
