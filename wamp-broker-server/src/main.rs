/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;

use crate::config::Config;
use clap::Parser;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use wamp_broker::observability::diagnostics;
use wamp_broker::{serve_peer, Broker, DefaultBroker, Peer, PeerConfig, WebSocketPeer};

#[derive(Parser)]
#[command()]
struct BrokerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

async fn serve_connection(
    broker: Arc<dyn Broker>,
    stream: TcpStream,
    remote: std::net::SocketAddr,
    peer_config: PeerConfig,
) {
    let peer = match WebSocketPeer::accept(stream, peer_config).await {
        Ok(peer) => Arc::new(peer),
        Err(err) => {
            warn!(remote = %remote, err = %err, "websocket upgrade failed");
            return;
        }
    };

    info!(remote = %remote, peer_id = peer.peer_id(), "client connected");
    serve_peer(broker, peer.clone()).await;

    if let Err(err) = peer.close().await {
        warn!(remote = %remote, peer_id = peer.peer_id(), err = %err, "error closing client");
    }
    info!(remote = %remote, peer_id = peer.peer_id(), "client disconnected");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = BrokerArgs::parse();
    let config = Config::load(&args.config)?;

    let _diagnostics = diagnostics::install(config.broker.debug)?;

    info!("Started wamp-broker-server");

    let listener = TcpListener::bind(&config.broker.listen_address).await?;
    info!(listen_address = %config.broker.listen_address, "listening for websocket clients");

    let broker: Arc<dyn Broker> = Arc::new(DefaultBroker::new());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    tokio::spawn(serve_connection(broker.clone(), stream, remote, config.peer));
                }
                Err(err) => warn!(err = %err, "failed to accept connection"),
            },
        }
    }

    Ok(())
}
