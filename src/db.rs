// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The database sink consumed by [`Log::db`](crate::Log::db).
//!
//! buflog does not talk to any database itself. Callers plug in a handle implementing
//! [`Database`], and every statement passed to `Log::db` is both recorded in the log buffer and
//! executed against that handle.
//!
//! # Examples
//!
//! ```
//! use buflog::Error;
//! use buflog::db::Database;
//! use buflog::db::Param;
//!
//! #[derive(Debug)]
//! struct Discard;
//!
//! impl Database for Discard {
//!     fn exec(&self, _statement: &str, _params: &[Param]) -> Result<(), Error> {
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;

use crate::Error;

/// A handle able to execute a statement with positional parameters.
pub trait Database: fmt::Debug + Send + Sync + 'static {
    /// Execute `statement` bound to `params`.
    fn exec(&self, statement: &str, params: &[Param]) -> Result<(), Error>;
}

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => f.write_str("NULL"),
            Param::Bool(v) => write!(f, "{v}"),
            Param::Int(v) => write!(f, "{v}"),
            Param::UInt(v) => write!(f, "{v}"),
            Param::Float(v) => write!(f, "{v}"),
            Param::Text(v) => f.write_str(v),
            Param::Bytes(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! impl_from_param {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_param! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

/// Render parameters the way they appear in the `SQL` log entry: separated by single spaces.
pub(crate) struct DisplayParams<'a>(pub(crate) &'a [Param]);

impl fmt::Display for DisplayParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_params() {
        let params = [
            Param::from(1),
            Param::from("alice"),
            Param::from(None::<i64>),
            Param::from(2.5),
        ];
        assert_eq!(DisplayParams(&params).to_string(), "1 alice NULL 2.5");
        assert_eq!(DisplayParams(&[]).to_string(), "");
    }
}
