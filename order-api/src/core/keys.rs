//! Store key naming

/// Key layout for records, indexes and daily counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    /// `order:<id>` holds the record as a JSON object
    pub record_prefix: String,
    /// Set of every live order ID
    pub all_index: String,
    /// `orders:by_phone:<normalized phone>` sets of order IDs
    pub phone_prefix: String,
    /// `orders:counter:<YYYYMMDD>` daily sequence counters
    pub counter_prefix: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            record_prefix: "order:".to_string(),
            all_index: "orders:index".to_string(),
            phone_prefix: "orders:by_phone:".to_string(),
            counter_prefix: "orders:counter:".to_string(),
        }
    }
}

impl KeySchema {
    pub fn record_key(&self, order_id: &str) -> String {
        format!("{}{}", self.record_prefix, order_id)
    }

    pub fn phone_index_key(&self, normalized_phone: &str) -> String {
        format!("{}{}", self.phone_prefix, normalized_phone)
    }

    pub fn counter_key(&self, yyyymmdd: &str) -> String {
        format!("{}{}", self.counter_prefix, yyyymmdd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_layout() {
        let keys = KeySchema::default();
        assert_eq!(keys.record_key("ORD20240101-000001"), "order:ORD20240101-000001");
        assert_eq!(keys.all_index, "orders:index");
        assert_eq!(keys.phone_index_key("123456"), "orders:by_phone:123456");
        assert_eq!(keys.phone_index_key(""), "orders:by_phone:");
        assert_eq!(keys.counter_key("20240101"), "orders:counter:20240101");
    }
}
