//! Cart data: in-memory only. Durable storage belongs to the host.

use emu_core::logging::{log, LogCategory, LogLevel};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartData {
    id: String,
}

impl CartData {
    /// - `None` asks whether an id is stored and returns `Some(has_data)`
    /// - `Some("")` clears the id and returns `None`
    /// - `Some(id)` stores the id for this session and returns `Some(false)`
    pub fn cartdata(&mut self, id: Option<&str>) -> Option<bool> {
        match id {
            None => Some(!self.id.is_empty()),
            Some("") => {
                self.id.clear();
                None
            }
            Some(id) => {
                self.id = id.to_string();
                log(LogCategory::Stubs, LogLevel::Info, || {
                    format!("cartdata(\"{}\") is not persisted", id)
                });
                Some(false)
            }
        }
    }

    pub fn id(&self) -> Option<&str> {
        (!self.id.is_empty()).then_some(self.id.as_str())
    }
}
