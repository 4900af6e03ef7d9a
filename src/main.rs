use concierge::ConciergeError;
use concierge::api::ApiClient;
use concierge::cart::OrderCart;
use concierge::config::fetch_config;
use concierge::realtime::{RealtimeListener, RealtimeMessage, feed_url};
use concierge::requests::RequestFeed;
use concierge::storage::{CartStore, FileStore, SessionStore};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ConciergeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = fetch_config()?;
    let store = FileStore::new(config.data_dir.clone());
    let client = ApiClient::new(&config.api_url, config.auth_token.clone())?;

    let cart = OrderCart::open(CartStore::new(store.clone())).await;
    info!(
        lines = cart.lines().len(),
        items = cart.total_items(),
        subtotal = %cart.subtotal(),
        "Cart ready"
    );

    let menu = client.fetch_menu().await?;
    let orderable = menu.products().filter(|p| p.is_orderable()).count();
    info!(sections = menu.sections.len(), orderable, "Menu loaded");

    let is_open = client.restaurant_is_open(&config.hours).await;
    info!(is_open, "Restaurant status");

    let Some(session) = SessionStore::new(store).load().await? else {
        info!("No guest signed in");
        return Ok(());
    };
    if !session.is_active_at(chrono::Utc::now()) {
        warn!(guest = %session.guest_name, "Stay is not active");
        return Ok(());
    }

    let mut feed = RequestFeed::new(session.clone());
    feed.load(client.list_requests_for(&session).await?);
    info!(pending = feed.visible(false).len(), "Requests loaded");

    let Some(socket_url) = &config.socket_url else {
        return Ok(());
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = RealtimeListener::new(feed_url(socket_url, &session.property)?, tx);
    tokio::spawn(listener.run());

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(RealtimeMessage::Event(event)) => {
                    if feed.apply(event) {
                        info!(pending = feed.visible(false).len(), "Requests updated");
                    }
                }
                Some(RealtimeMessage::Connected) => info!("Live updates connected"),
                Some(RealtimeMessage::Disconnected) => warn!("Live updates disconnected"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    cart.flush().await;
    Ok(())
}
