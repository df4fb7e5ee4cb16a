use crate::lifecycle::config::DnsConfig;
use crate::model::{DnsInstructions, DnsRecord, DnsRecordType};

/// Records a customer publishes to point a custom domain at the platform: the apex
/// `A` record and a `www` `CNAME`.
pub fn dns_instructions(dns: &DnsConfig) -> DnsInstructions {
    DnsInstructions {
        records: vec![
            DnsRecord {
                record_type: DnsRecordType::A,
                name: "@".into(),
                value: dns.apex_target.to_string(),
                ttl: dns.ttl,
            },
            DnsRecord {
                record_type: DnsRecordType::Cname,
                name: "www".into(),
                value: dns.cname_target.clone(),
                ttl: dns.ttl,
            },
        ],
        notes: vec![
            "Add these DNS records at your domain registrar".into(),
            "DNS propagation can take 24-48 hours".into(),
            "Once configured, verification will happen automatically".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_a_and_one_cname() {
        let instructions = dns_instructions(&DnsConfig::default());
        let a: Vec<_> = instructions
            .records
            .iter()
            .filter(|r| r.record_type == DnsRecordType::A)
            .collect();
        let cname: Vec<_> = instructions
            .records
            .iter()
            .filter(|r| r.record_type == DnsRecordType::Cname)
            .collect();
        assert_eq!(a.len(), 1);
        assert_eq!(cname.len(), 1);
        assert_eq!(a[0].value, "76.76.21.21");
        assert_eq!(cname[0].name, "www");
        assert_eq!(cname[0].value, "cname.vercel-dns.com");
        assert_eq!(instructions.notes.len(), 3);
    }

    #[test]
    fn serializes_record_type_in_dns_notation() {
        let json = serde_json::to_value(dns_instructions(&DnsConfig::default())).unwrap();
        assert_eq!(json["records"][1]["type"], "CNAME");
        assert_eq!(json["records"][0]["ttl"], 3600);
    }
}
