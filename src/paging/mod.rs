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

//! Mark-based paging.
//!
//! A page request carries an optional mark (the last element the caller saw), a direction
//! and a size. The mark itself is never part of the returned page and does not need to
//! exist anymore when the next request is issued: paging resumes from where the mark
//! would sort.
//!
//! Pages are always returned in ascending order, whatever the navigation direction.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::core::{Result, WideIndexError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Navigation {
    #[default]
    Next,
    Previous,
}

impl Navigation {
    /// Whether the store has to be scanned in reverse order.
    pub fn is_reverse(self) -> bool {
        self == Navigation::Previous
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkPageRequest<M> {
    mark: Option<M>,
    navigation: Navigation,
    size: usize,
}

impl<M> MarkPageRequest<M> {
    /// Request for the first page.
    pub fn first(size: usize) -> Result<Self> {
        Self::new(None, Navigation::Next, size)
    }

    pub fn new(mark: Option<M>, navigation: Navigation, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(WideIndexError::invalid_argument("page size must be greater than zero"));
        }
        Ok(Self {
            mark,
            navigation,
            size,
        })
    }

    pub fn mark(&self) -> Option<&M> {
        self.mark.as_ref()
    }

    pub fn navigation(&self) -> Navigation {
        self.navigation
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Same navigation and size with a mark of another type.
    pub fn convert<N>(&self, f: impl FnOnce(&M) -> N) -> MarkPageRequest<N> {
        MarkPageRequest {
            mark: self.mark.as_ref().map(f),
            navigation: self.navigation,
            size: self.size,
        }
    }

    pub fn map_mark<N>(self, f: impl FnOnce(M) -> N) -> MarkPageRequest<N> {
        MarkPageRequest {
            mark: self.mark.map(f),
            navigation: self.navigation,
            size: self.size,
        }
    }

    pub fn try_map_mark<N>(self, f: impl FnOnce(M) -> Result<N>) -> Result<MarkPageRequest<N>> {
        Ok(MarkPageRequest {
            mark: self.mark.map(f).transpose()?,
            navigation: self.navigation,
            size: self.size,
        })
    }

    pub(crate) fn with_size(&self, size: usize) -> MarkPageRequest<M>
    where
        M: Clone,
    {
        MarkPageRequest {
            mark: self.mark.clone(),
            navigation: self.navigation,
            size: size.max(1),
        }
    }
}

/// Page of data plus the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkPage<T> {
    request: MarkPageRequest<T>,
    data: Vec<T>,
}

impl<T> MarkPage<T> {
    pub fn new(request: MarkPageRequest<T>, data: Vec<T>) -> Self {
        Self { request, data }
    }

    pub fn request(&self) -> &MarkPageRequest<T> {
        &self.request
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> MarkPage<U> {
        let MarkPage { request, data } = self;
        let request = MarkPageRequest {
            mark: request.mark.map(&mut f),
            navigation: request.navigation,
            size: request.size,
        };
        MarkPage {
            request,
            data: data.into_iter().map(f).collect(),
        }
    }

    pub fn try_map<U>(self, mut f: impl FnMut(T) -> Result<U>) -> Result<MarkPage<U>> {
        let MarkPage { request, data } = self;
        let request = MarkPageRequest {
            mark: request.mark.map(&mut f).transpose()?,
            navigation: request.navigation,
            size: request.size,
        };
        let data = data.into_iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(MarkPage { request, data })
    }
}

impl<T: Clone> MarkPage<T> {
    /// Request for the page after this one, `None` when this page is empty.
    pub fn next_page_request(&self) -> Option<MarkPageRequest<T>> {
        self.data.last().map(|last| MarkPageRequest {
            mark: Some(last.clone()),
            navigation: Navigation::Next,
            size: self.request.size,
        })
    }

    /// Request for the page before this one, `None` when this page is empty.
    pub fn previous_page_request(&self) -> Option<MarkPageRequest<T>> {
        self.data.first().map(|first| MarkPageRequest {
            mark: Some(first.clone()),
            navigation: Navigation::Previous,
            size: self.request.size,
        })
    }
}

impl<C: Clone, D> MarkPage<Column<C, D>> {
    /// Next page request marked by column name, as accepted by column range reads.
    pub fn next_request_by_name(&self) -> Option<MarkPageRequest<C>> {
        self.data.last().map(|last| MarkPageRequest {
            mark: Some(last.name().clone()),
            navigation: Navigation::Next,
            size: self.request.size,
        })
    }

    pub fn previous_request_by_name(&self) -> Option<MarkPageRequest<C>> {
        self.data.first().map(|first| MarkPageRequest {
            mark: Some(first.name().clone()),
            navigation: Navigation::Previous,
            size: self.request.size,
        })
    }
}

/// Number of elements to fetch for a request: one extra when a mark is set, since the
/// mark itself may come back.
pub(crate) fn fetch_size<M>(request: &MarkPageRequest<M>) -> usize {
    match request.mark {
        Some(_) => request.size.saturating_add(1),
        None => request.size,
    }
}

/// Turns elements fetched in scan direction into page data.
///
/// Returns the mark element when it was fetched, and the page in ascending order.
pub(crate) fn assemble_page<M, T>(
    request: &MarkPageRequest<M>,
    mut fetched: Vec<T>,
    is_mark: impl Fn(&T) -> bool,
) -> (Option<T>, Vec<T>) {
    let mut mark = None;
    if request.mark.is_some() {
        if let Some(position) = fetched.iter().position(|element| is_mark(element)) {
            mark = Some(fetched.remove(position));
        }
    }
    fetched.truncate(request.size);
    if request.navigation.is_reverse() {
        fetched.reverse();
    }
    (mark, fetched)
}
