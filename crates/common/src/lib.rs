pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::ok("running");
        assert_eq!(h.status, "OK");
        assert_eq!(h.message, "running");
    }
}
