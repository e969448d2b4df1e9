/// The name-mask template used to synthesize a hostname from a recursed
/// class (§4.6). `%i` and `%c` are substituted once each.
#[derive(Debug, Clone)]
pub struct NameMask {
    template: String,
}

impl Default for NameMask {
    fn default() -> Self {
        Self::new("%i.%c".to_string())
    }
}

impl NameMask {
    pub fn new(template: String) -> Self {
        Self { template }
    }

    pub fn apply(&self, address: &str, class_name: &str) -> String {
        let with_ip = self.template.replacen("%i", address, 1);
        with_ip.replacen("%c", class_name, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mask() {
        let mask = NameMask::default();
        assert_eq!(mask.apply("1.2.3.4", "net.example"), "1.2.3.4.net.example");
    }

    #[test]
    fn custom_mask_substitutes_each_token_once() {
        let mask = NameMask::new("host-%i.in.%c.net".to_string());
        assert_eq!(
            mask.apply("10.0.0.1", "example"),
            "host-10.0.0.1.in.example.net"
        );
    }
}
