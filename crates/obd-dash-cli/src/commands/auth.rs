use anyhow::Result;
use obd_dash_core::client::{Session, TelemetryClient};
use obd_dash_core::config::Config;

use super::authed_client;

pub async fn login(config: &Config, email: &str, password: &str) -> Result<()> {
    let client = TelemetryClient::new(config, Session::anonymous())?;
    let token = client.login(email, password).await?;

    eprintln!("Logged in as {}. Export the token to use it:", email);
    println!("export OBD_DASH_TOKEN={}", token);
    Ok(())
}

pub async fn register(config: &Config, email: &str, password: &str) -> Result<()> {
    let client = TelemetryClient::new(config, Session::anonymous())?;
    client.register(email, password).await?;
    println!("Account created for {}. You can now log in.", email);
    Ok(())
}

pub async fn logout(config: &Config, token: Option<String>) -> Result<()> {
    let client = authed_client(config, token)?;
    client.logout().await?;
    println!("Logged out. Unset OBD_DASH_TOKEN.");
    Ok(())
}

pub async fn device_token(config: &Config, token: Option<String>) -> Result<()> {
    let client = authed_client(config, token)?;
    let device_token = client.issue_device_token().await?;

    eprintln!("Configure the in-car agent with this token:");
    println!("{}", device_token);
    Ok(())
}

pub async fn supported_fields(config: &Config, token: Option<String>) -> Result<()> {
    let client = authed_client(config, token)?;
    for field in client.supported_data_types().await? {
        println!("{}", field);
    }
    Ok(())
}
