//! Wire-format construction and parsing for the two query shapes the core
//! issues: host PTR lookups and class NS/SOA lookups (§4.3, §4.4).

use std::str::FromStr;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};

use revlog_domain::{ClassKey, HostKey, RuntimeError};

fn malformed(what: &str) -> RuntimeError {
    RuntimeError::MalformedReply(what.to_string())
}

fn build_query(name: &str, record_type: RecordType) -> Result<(u16, Vec<u8>), RuntimeError> {
    let name = Name::from_str(name).map_err(|e| malformed(&format!("bad query name {name}: {e}")))?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let id = fastrand::u16(..);
    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(64);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| malformed(&format!("failed to serialize query: {e}")))?;
    Ok((id, buf))
}

/// Builds a PTR query for `IN-ADDR.ARPA` lookup of a single host (§4.3).
pub fn build_ptr_query(host: HostKey) -> Result<(u16, Vec<u8>), RuntimeError> {
    build_query(&host.reverse_arpa_name(), RecordType::PTR)
}

/// Builds an NS query for the reverse name of a class prefix (§4.3).
pub fn build_class_ns_query(class: ClassKey) -> Result<(u16, Vec<u8>), RuntimeError> {
    build_query(&class.reverse_arpa_name(), RecordType::NS)
}

/// Parses a PTR response (§4.4 point 3, host reply): the last PTR record
/// observed wins if more than one is present; no PTR record is a failure.
pub fn parse_ptr_response(bytes: &[u8]) -> Result<Option<String>, RuntimeError> {
    let message = Message::from_vec(bytes).map_err(|e| malformed(&format!("undecodable reply: {e}")))?;
    if message.response_code() != ResponseCode::NoError {
        return Ok(None);
    }
    let mut last = None;
    for record in message.answers() {
        if let RData::PTR(name) = record.data() {
            last = Some(strip_trailing_dot(&name.to_utf8()));
        }
    }
    Ok(last)
}

/// Parses a class NS/SOA response per the SOA-then-NS tie-break (§4.4 point
/// 3, §9): scan answers then authority records for SOA first, then NS;
/// the first SOA `mname` or NS `nsdname` observed wins. No usable record is
/// a failure.
pub fn parse_class_ns_response(bytes: &[u8]) -> Result<Option<String>, RuntimeError> {
    let message = Message::from_vec(bytes).map_err(|e| malformed(&format!("undecodable reply: {e}")))?;
    if message.response_code() != ResponseCode::NoError {
        return Ok(None);
    }

    let records = message.answers().iter().chain(message.name_servers());

    let mut first_soa = None;
    let mut first_ns = None;
    for record in records {
        match record.data() {
            RData::SOA(soa) if first_soa.is_none() => {
                first_soa = Some(soa.mname().to_utf8());
            }
            RData::NS(ns) if first_ns.is_none() => {
                first_ns = Some(ns.to_utf8());
            }
            _ => {}
        }
    }

    let fulldomain = first_soa.or(first_ns);
    Ok(fulldomain.map(|d| split_class_name(&strip_trailing_dot(&d))))
}

/// Splits `fulldomain` at the first dot into `(head, rest)`; adopts
/// `rest` lowercased if `rest` still contains a dot, else the whole name
/// lowercased (§4.4 point 3).
fn split_class_name(fulldomain: &str) -> String {
    match fulldomain.split_once('.') {
        Some((_head, rest)) if rest.contains('.') => rest.to_ascii_lowercase(),
        _ => fulldomain.to_ascii_lowercase(),
    }
}

fn strip_trailing_dot(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::{NS, PTR, SOA};
    use hickory_proto::rr::{DNSClass as Class, Record};

    fn encode(message: &Message) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).unwrap();
        buf
    }

    #[test]
    fn builds_ptr_query_against_reversed_name() {
        let host = HostKey("192.168.1.7".parse().unwrap());
        let (_id, bytes) = build_ptr_query(host).unwrap();
        let message = Message::from_vec(&bytes).unwrap();
        assert_eq!(
            message.queries()[0].name().to_utf8(),
            "7.1.168.192.in-addr.arpa."
        );
        assert_eq!(message.queries()[0].query_type(), RecordType::PTR);
    }

    #[test]
    fn parses_last_ptr_record_when_several_present() {
        let mut message = Message::new();
        message.set_response_code(ResponseCode::NoError);
        let name = Name::from_str("7.1.168.192.in-addr.arpa.").unwrap();
        for host in ["first.example.", "second.example."] {
            let mut record = Record::with(name.clone(), RecordType::PTR, 300);
            record.set_dns_class(Class::IN);
            record.set_data(Some(RData::PTR(Name::from_str(host).unwrap())));
            message.add_answer(record);
        }
        let bytes = encode(&message);
        assert_eq!(
            parse_ptr_response(&bytes).unwrap(),
            Some("second.example".to_string())
        );
    }

    #[test]
    fn no_ptr_record_is_a_failure() {
        let mut message = Message::new();
        message.set_response_code(ResponseCode::NoError);
        assert_eq!(parse_ptr_response(&encode(&message)).unwrap(), None);
    }

    #[test]
    fn soa_wins_over_ns_and_splits_on_first_dot() {
        let mut message = Message::new();
        message.set_response_code(ResponseCode::NoError);
        let qname = Name::from_str("168.192.in-addr.arpa.").unwrap();

        let mut ns_record = Record::with(qname.clone(), RecordType::NS, 300);
        ns_record.set_dns_class(Class::IN);
        ns_record.set_data(Some(RData::NS(Name::from_str("ns1.isp.example.").unwrap())));
        message.add_name_server(ns_record);

        let mut soa_record = Record::with(qname, RecordType::SOA, 300);
        soa_record.set_dns_class(Class::IN);
        soa_record.set_data(Some(RData::SOA(SOA::new(
            Name::from_str("dns1.isp.example.").unwrap(),
            Name::from_str("hostmaster.isp.example.").unwrap(),
            1,
            3600,
            600,
            86400,
            3600,
        ))));
        message.add_answer(soa_record);

        let bytes = encode(&message);
        assert_eq!(
            parse_class_ns_response(&bytes).unwrap(),
            Some("isp.example".to_string())
        );
    }

    #[test]
    fn falls_back_to_ns_when_no_soa_present() {
        let mut message = Message::new();
        message.set_response_code(ResponseCode::NoError);
        let qname = Name::from_str("192.in-addr.arpa.").unwrap();
        let mut record = Record::with(qname, RecordType::NS, 300);
        record.set_dns_class(Class::IN);
        record.set_data(Some(RData::NS(Name::from_str("ns.example.net.").unwrap())));
        message.add_name_server(record);

        let bytes = encode(&message);
        assert_eq!(
            parse_class_ns_response(&bytes).unwrap(),
            Some("example.net".to_string())
        );
    }

    #[test]
    fn no_dot_in_rest_keeps_whole_fulldomain() {
        assert_eq!(split_class_name("example"), "example");
        assert_eq!(split_class_name("a.b"), "b");
        assert_eq!(split_class_name("a.b.c"), "b.c");
    }
}
