#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    school_portal_server::run().await
}
