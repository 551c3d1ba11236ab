#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    obra_report_server::run().await
}
