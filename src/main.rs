fn main() -> anyhow::Result<()> {
    cyber_run::app::run()
}
