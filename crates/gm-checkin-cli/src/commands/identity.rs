use super::{CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let token = ctx
        .config
        .farcaster
        .token
        .as_deref()
        .ok_or("farcaster.token is not configured")?;
    let identity = ctx.farcaster_client().me(token).await?;

    if ctx.json {
        return ctx.print_json(&identity);
    }

    println!("{} (@{})", identity.display_name, identity.username);
    println!("FID: {}", identity.fid);
    if !identity.bio.is_empty() {
        println!("{}", identity.bio);
    }
    println!(
        "{} followers · {} following",
        identity.follower_count, identity.following_count
    );
    if let Some(address) = &identity.primary_address {
        println!("Wallet: {address}");
    }
    Ok(())
}
