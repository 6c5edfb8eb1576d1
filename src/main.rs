use env_logger::Env;

fn main() -> anyhow::Result<()> {
    // warnings are advisory and should show without RUST_LOG being set
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    rensc::run()
}
