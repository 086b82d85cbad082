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

use crate::message::Dict;
use crate::sender::SenderRef;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

///
/// [`Route`] is a read-only projection of one subscription: the subscriber handle and
/// the option set it subscribed with. Eligibility policies evaluate routes without
/// touching broker storage.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use serde_json::json;
/// use wamp_broker::{Dict, Message, PeerError, Route, Sender, SenderRef};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Sender for Discard {
///     async fn send(&self, _message: Message) -> Result<(), PeerError> {
///         Ok(())
///     }
/// }
///
/// let subscriber: SenderRef = Arc::new(Discard);
/// let mut options = Dict::new();
/// options.insert("role".to_string(), json!("admin"));
///
/// let route = Route::new(subscriber, options);
/// assert_eq!(route.options.get("role"), Some(&json!("admin")));
/// ```
#[derive(Clone)]
pub struct Route {
    pub sender: SenderRef,
    pub options: Dict,
}

impl Route {
    pub fn new(sender: SenderRef, options: Dict) -> Self {
        Self { sender, options }
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("sender", &(Arc::as_ptr(&self.sender) as *const ()))
            .field("options", &self.options)
            .finish()
    }
}
