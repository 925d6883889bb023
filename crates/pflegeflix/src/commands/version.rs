pub fn run() -> anyhow::Result<()> {
    println!("pflegeflix {}", env!("CARGO_PKG_VERSION"));
    println!("Consent-gated job funnel tracking");
    Ok(())
}
