use account_service::{config::get_configuration, startup::Application};
use service_core::observability::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging("account-service", "info");

    let configuration = get_configuration()?;

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;

    Ok(())
}
