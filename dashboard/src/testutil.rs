use axum::Router;
use tokio::net::TcpListener;

/// Binds a router on an ephemeral loopback port and serves it in the
/// background, standing in for the remote gateway service.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
