use tokio::net::UdpSocket;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "5683".to_string());
    let addr = format!("127.0.0.1:{port}");
    let socket = UdpSocket::bind(&addr).await?;
    println!("listening on coap://{addr}");
    mock_server::run(socket).await
}
