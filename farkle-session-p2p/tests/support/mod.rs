#![allow(dead_code)]

mod memory_transport;

pub use memory_transport::{create_hub, MemoryHub, MemoryTransport};

use farkle_session_core::{DeviceId, GameConfig, TrustingEvaluator};
use farkle_session_p2p::{ClientSessionLoop, HostSessionLoop, SessionCode, SessionConfig};
use std::sync::{Arc, Mutex};

/// Host loop wired to the shared hub, with test timers; the returned
/// transport handle allows link manipulation from the test
pub fn host_loop(
    hub: &Arc<Mutex<MemoryHub>>,
    game_config: GameConfig,
) -> (HostSessionLoop<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new(hub.clone());
    let handle = transport.clone();
    let host = HostSessionLoop::new(
        transport,
        DeviceId::generate(),
        "Host".to_string(),
        game_config,
        Box::new(TrustingEvaluator),
        SessionConfig::immediate(),
    )
    .expect("host loop");
    (host, handle)
}

/// Client loop wired to the shared hub, with test timers
pub fn client_loop(
    hub: &Arc<Mutex<MemoryHub>>,
    display_name: &str,
    session_code: SessionCode,
) -> (ClientSessionLoop<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new(hub.clone());
    let handle = transport.clone();
    let client = ClientSessionLoop::new(
        transport,
        DeviceId::generate(),
        display_name.to_string(),
        session_code,
        SessionConfig::immediate(),
    );
    (client, handle)
}

/// Run a few poll cycles so in-flight messages settle
pub fn pump(
    host: &mut HostSessionLoop<MemoryTransport>,
    clients: &mut [&mut ClientSessionLoop<MemoryTransport>],
) {
    for _ in 0..8 {
        host.poll();
        for client in clients.iter_mut() {
            client.poll();
        }
    }
}
