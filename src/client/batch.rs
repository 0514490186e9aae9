/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Atomic groups of mutations.
//!
//! ```ignore
//! let batch = client.prepare_batch();
//! index.insert(&entry, None, &key, batch.client()).await?;
//! main.insert(&row, batch.client()).await?;
//! batch.execute().await?;
//! ```
//!
//! Writes issued through `batch.client()` are buffered and sent as a single mutation when
//! the batch executes. Reads through the batch-scoped client go straight to the store and
//! do not see buffered writes.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::driver::Mutation;
use super::Client;
use crate::core::Result;

#[derive(Debug, Default)]
pub(crate) struct BatchBuffer {
    mutations: Mutex<Vec<Mutation>>,
}

impl BatchBuffer {
    pub(crate) fn push(&self, mutations: Vec<Mutation>) {
        self.mutations.lock().extend(mutations);
    }

    fn take(&self) -> Vec<Mutation> {
        std::mem::take(&mut *self.mutations.lock())
    }

    fn len(&self) -> usize {
        self.mutations.lock().len()
    }
}

pub struct Batch {
    client: Client,
    buffer: Arc<BatchBuffer>,
    nested: bool,
}

impl Batch {
    pub(crate) fn new(client: Client, buffer: Arc<BatchBuffer>, nested: bool) -> Self {
        Self {
            client,
            buffer,
            nested,
        }
    }

    /// Client whose writes join this batch.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A nested batch shares the buffer of the batch it was prepared from.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies the buffered mutations atomically. Nested batches leave the commit to the
    /// outermost batch.
    pub async fn execute(self) -> Result<()> {
        if self.nested {
            debug!("Nested batch execution deferred to the enclosing batch");
            return Ok(());
        }
        let mutations = self.buffer.take();
        if mutations.is_empty() {
            return Ok(());
        }
        debug!("Executing batch of {} mutations", mutations.len());
        self.client.apply_now(mutations).await
    }
}
