use pflegeflix_core::classify_device;

pub fn run(user_agent: &str) -> anyhow::Result<()> {
    println!("{}", classify_device(user_agent));
    Ok(())
}
