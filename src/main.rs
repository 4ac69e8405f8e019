fn main() -> anyhow::Result<()> {
    certstamp::run()
}
