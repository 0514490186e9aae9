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

use uuid::Uuid;

/// Lowest string in comparator order.
pub const STRING_RANGE_START: &str = "";

/// A string sorting after every string that does not itself start with `char::MAX`.
pub const STRING_RANGE_END: &str = "\u{10FFFF}";

/// Inclusive lowest and highest values of a row key type, used to build range bounds
/// over composite column names whose trailing component is a row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeLimit<T> {
    start: T,
    end: T,
}

impl<T> RangeLimit<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> &T {
        &self.start
    }

    pub fn end(&self) -> &T {
        &self.end
    }
}

impl RangeLimit<String> {
    pub fn string() -> Self {
        Self::new(STRING_RANGE_START.to_string(), STRING_RANGE_END.to_string())
    }
}

impl RangeLimit<i64> {
    pub fn long() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }
}

impl RangeLimit<i32> {
    pub fn integer() -> Self {
        Self::new(i32::MIN, i32::MAX)
    }
}

impl RangeLimit<Uuid> {
    pub fn uuid() -> Self {
        Self::new(Uuid::nil(), Uuid::from_bytes([0xff; 16]))
    }
}
