fn main() -> anyhow::Result<()> {
    alpha_fee_app::run()
}
