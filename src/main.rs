use anyhow::Context;

fn main() -> anyhow::Result<()> {
    region_selector::run().context("region-selector failed")
}
