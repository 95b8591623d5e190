//! Response rewriting: randomized case-mutation of name targets.
//!
//! When a response qualifies (question type CNAME, NS, or SOA), every CNAME
//! and NS target and every SOA primary name server in the answer section is
//! re-cased at random before the message is re-encoded. DNS names compare
//! case-insensitively on the wire, so resolvers accept the reply; anything
//! matching names byte-for-byte will notice. The mutation is deliberately
//! non-deterministic and non-idempotent: two calls over the same input may
//! produce different output. That is the observable behavior this proxy
//! exists to demonstrate, not a defect.

use hickory_proto::ProtoError;
use hickory_proto::op::Message;
use hickory_proto::rr::rdata::{CNAME, NS, SOA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use rand::Rng;
use tracing::debug;

/// Whether responses to this question type get rewritten.
///
/// The filter keys on the question type, never on individual answer records:
/// an A question whose answer happens to carry a CNAME chain passes through
/// untouched.
pub fn applies_to(qtype: RecordType) -> bool {
    matches!(qtype, RecordType::CNAME | RecordType::NS | RecordType::SOA)
}

/// Rebuild the answer section with case-mutated name targets.
///
/// Record count, order, owner names, classes, TTLs and types are preserved;
/// authority and additional sections are untouched.
pub fn rewrite_response(mut response: Message) -> Result<Message, ProtoError> {
    let answers = response.take_answers();
    let mut rewritten = Vec::with_capacity(answers.len());

    for record in answers {
        rewritten.push(rewrite_record(record)?);
    }

    response.insert_answers(rewritten);
    Ok(response)
}

/// Case-mutate one record, passing non-qualifying types through unchanged.
fn rewrite_record(record: Record) -> Result<Record, ProtoError> {
    let rdata = match record.data() {
        RData::CNAME(target) => {
            let garbled = scramble_name(&target.0)?;
            debug!(original = %target.0, garbled = %garbled, "rewrote CNAME target");
            RData::CNAME(CNAME(garbled))
        }
        RData::NS(target) => {
            let garbled = scramble_name(&target.0)?;
            debug!(original = %target.0, garbled = %garbled, "rewrote NS target");
            RData::NS(NS(garbled))
        }
        RData::SOA(soa) => {
            let garbled = scramble_name(soa.mname())?;
            debug!(original = %soa.mname(), garbled = %garbled, "rewrote SOA primary name server");
            RData::SOA(SOA::new(
                garbled,
                soa.rname().clone(),
                soa.serial(),
                soa.refresh(),
                soa.retry(),
                soa.expire(),
                soa.minimum(),
            ))
        }
        _ => return Ok(record),
    };

    let mut garbled = Record::from_rdata(record.name().clone(), record.ttl(), rdata);
    garbled.set_dns_class(record.dns_class());
    Ok(garbled)
}

/// Re-case a name's textual form, keeping it a valid DNS name.
fn scramble_name(name: &Name) -> Result<Name, ProtoError> {
    Name::from_ascii(scramble_case(&name.to_utf8()))
}

/// Uppercase each character independently with probability one half.
///
/// A pure case permutation: characters with no uppercase form (dots, digits,
/// hyphens) come through untouched, and nothing is ever inserted, removed,
/// or reordered. Output is random by design; two calls on the same input are
/// allowed to disagree.
pub fn scramble_case(text: &str) -> String {
    let mut rng = rand::rng();
    text.chars()
        .map(|c| if rng.random() { c.to_ascii_uppercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::{Message, MessageType, OpCode};
    use hickory_proto::rr::DNSClass;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn response_with_answers(answers: Vec<Record>) -> Message {
        let mut message = Message::new(0x1234, MessageType::Response, OpCode::Query);
        message.insert_answers(answers);
        message
    }

    #[test]
    fn applies_to_exactly_cname_ns_soa() {
        assert!(applies_to(RecordType::CNAME));
        assert!(applies_to(RecordType::NS));
        assert!(applies_to(RecordType::SOA));

        assert!(!applies_to(RecordType::A));
        assert!(!applies_to(RecordType::AAAA));
        assert!(!applies_to(RecordType::MX));
        assert!(!applies_to(RecordType::TXT));
    }

    #[test]
    fn scramble_case_is_a_pure_case_permutation() {
        let input = "www.example-1.com.";
        let output = scramble_case(input);

        assert_eq!(output.len(), input.len());
        assert_eq!(output.to_ascii_lowercase(), input.to_ascii_lowercase());
    }

    #[test]
    fn scramble_case_leaves_non_letters_alone() {
        let output = scramble_case("...---123...");

        assert_eq!(output, "...---123...");
    }

    #[test]
    fn scramble_case_runs_may_differ() {
        // Intentionally non-deterministic: repeated calls are allowed to
        // disagree, so only the permutation property may be asserted.
        let input = "www.example.com.";
        let first = scramble_case(input);
        let second = scramble_case(input);

        assert_eq!(first.to_ascii_lowercase(), second.to_ascii_lowercase());
    }

    #[test]
    fn cname_target_is_recased_but_record_shape_is_kept() {
        let record = Record::from_rdata(
            name("www.example.com."),
            300,
            RData::CNAME(CNAME(name("example.com."))),
        );
        let response = response_with_answers(vec![record]);

        let rewritten = rewrite_response(response).unwrap();

        assert_eq!(rewritten.answers().len(), 1);
        let answer = &rewritten.answers()[0];
        assert_eq!(answer.name(), &name("www.example.com."));
        assert_eq!(answer.record_type(), RecordType::CNAME);
        assert_eq!(answer.dns_class(), DNSClass::IN);
        assert_eq!(answer.ttl(), 300);

        let RData::CNAME(target) = answer.data() else {
            panic!("expected CNAME rdata");
        };
        assert_eq!(target.0.to_utf8().to_ascii_lowercase(), "example.com.");
    }

    #[test]
    fn soa_rewrites_only_the_primary_name_server() {
        let soa = SOA::new(
            name("ns1.example.com."),
            name("hostmaster.example.com."),
            2024010101,
            7200,
            900,
            1209600,
            3600,
        );
        let record = Record::from_rdata(name("example.com."), 1800, RData::SOA(soa));
        let response = response_with_answers(vec![record]);

        let rewritten = rewrite_response(response).unwrap();

        let RData::SOA(soa) = rewritten.answers()[0].data() else {
            panic!("expected SOA rdata");
        };
        assert_eq!(soa.mname().to_utf8().to_ascii_lowercase(), "ns1.example.com.");
        assert_eq!(soa.rname(), &name("hostmaster.example.com."));
        assert_eq!(soa.serial(), 2024010101);
        assert_eq!(soa.refresh(), 7200);
        assert_eq!(soa.retry(), 900);
        assert_eq!(soa.expire(), 1209600);
        assert_eq!(soa.minimum(), 3600);
    }

    #[test]
    fn non_qualifying_records_pass_through_unchanged() {
        let a_record = Record::from_rdata(
            name("example.com."),
            60,
            RData::A(hickory_proto::rr::rdata::A(Ipv4Addr::new(93, 184, 216, 34))),
        );
        let response = response_with_answers(vec![a_record.clone()]);

        let rewritten = rewrite_response(response).unwrap();

        assert_eq!(rewritten.answers(), &[a_record]);
    }

    #[test]
    fn answer_order_and_types_are_preserved() {
        let answers = vec![
            Record::from_rdata(
                name("example.com."),
                3600,
                RData::NS(NS(name("ns1.example.com."))),
            ),
            Record::from_rdata(
                name("example.com."),
                60,
                RData::A(hickory_proto::rr::rdata::A(Ipv4Addr::new(93, 184, 216, 34))),
            ),
            Record::from_rdata(
                name("example.com."),
                3600,
                RData::NS(NS(name("ns2.example.com."))),
            ),
        ];
        let response = response_with_answers(answers);

        let rewritten = rewrite_response(response).unwrap();

        let types: Vec<RecordType> = rewritten
            .answers()
            .iter()
            .map(|r| r.record_type())
            .collect();
        assert_eq!(types, vec![RecordType::NS, RecordType::A, RecordType::NS]);

        let RData::NS(first) = rewritten.answers()[0].data() else {
            panic!("expected NS rdata");
        };
        let RData::NS(last) = rewritten.answers()[2].data() else {
            panic!("expected NS rdata");
        };
        assert_eq!(first.0.to_utf8().to_ascii_lowercase(), "ns1.example.com.");
        assert_eq!(last.0.to_utf8().to_ascii_lowercase(), "ns2.example.com.");
    }

    #[test]
    fn rewritten_message_still_encodes() {
        let record = Record::from_rdata(
            name("www.example.com."),
            300,
            RData::CNAME(CNAME(name("example.com."))),
        );
        let response = response_with_answers(vec![record]);

        let rewritten = rewrite_response(response).unwrap();
        let bytes = rewritten.to_vec().unwrap();

        let decoded = Message::from_vec(&bytes).unwrap();
        assert_eq!(decoded.answers().len(), 1);
        assert_eq!(decoded.answers()[0].record_type(), RecordType::CNAME);
    }
}
