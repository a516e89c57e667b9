use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RoomCodeError;

pub const ROOM_PARAM: &str = "room";

/// A six digit room identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub const LEN: usize = 6;

    pub fn generate() -> Self {
        let n: u32 = rand::rng().random_range(100_000..=999_999);
        Self(n.to_string())
    }

    pub fn parse(s: &str) -> Result<Self, RoomCodeError> {
        let actual = s.chars().count();
        if actual != Self::LEN {
            return Err(RoomCodeError::WrongLength { expected: Self::LEN, actual });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RoomCodeError::NotDigits);
        }
        Ok(Self(s.to_owned()))
    }

    /// Reads the `room` parameter of a start-up address.
    ///
    /// Returns the code and the address with the parameter stripped, leaving other
    /// query pairs in place.
    pub fn from_deep_link(address: &str) -> Option<(Self, String)> {
        let mut url = Url::parse(address).ok()?;
        let code = room_param(&url)?;

        let rest: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != ROOM_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if rest.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(rest);
        }

        Some((code, url.into()))
    }

    /// Decodes a scanned payload. A URL contributes its `room` parameter, anything else
    /// must be the bare code. Unrecognised payloads yield `None` and the scan goes on.
    pub fn from_scan(payload: &str) -> Option<Self> {
        match Url::parse(payload) {
            Ok(url) => room_param(&url),
            Err(_) => Self::parse(payload).ok(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn document_path(&self) -> String {
        format!("sync_rooms/{}", self.0)
    }

    pub fn blob_prefix(&self) -> String {
        format!("uploads/{}/", self.0)
    }

    pub fn blob_path(&self, key: &str) -> String {
        format!("{}{key}", self.blob_prefix())
    }

    /// `<origin>?room=<code>`, the payload encoded into the room's visual code.
    pub fn share_link(&self, origin: &str) -> String {
        format!("{}?{ROOM_PARAM}={}", origin.trim_end_matches('/'), self.0)
    }
}

fn room_param(url: &Url) -> Option<RoomCode> {
    url.query_pairs()
        .find(|(k, _)| k == ROOM_PARAM)
        .and_then(|(_, v)| RoomCode::parse(&v).ok())
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RoomCode({})", self.0)
    }
}

/// Manual code entry: keeps digits only, at most six of them.
#[derive(Debug, Default, Clone)]
pub struct CodeInput {
    digits: String,
}

impl CodeInput {
    pub fn set(&mut self, raw: &str) {
        self.digits = raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(RoomCode::LEN)
            .collect();
    }

    pub fn value(&self) -> &str {
        &self.digits
    }

    pub fn can_submit(&self) -> bool {
        self.digits.len() == RoomCode::LEN
    }

    pub fn submit(&self) -> Option<RoomCode> {
        if !self.can_submit() {
            return None;
        }
        RoomCode::parse(&self.digits).ok()
    }
}
