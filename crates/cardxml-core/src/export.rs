//! Canonical `CardDefs` documents
//!
//! A finished corpus is written as one `CardDefs` element carrying the build,
//! with one `Entity` per short id. The same format reads back into a corpus
//! so two finished builds can be diffed.

use crate::entity::{Corpus, Entity, RawCorpus, RawDocument, RawShape};
use crate::error::{Error, Result};
use crate::locale::{LocaleBag, LocaleConfig};
use crate::localizer::merge_locales;
use crate::normalizer::{parse_card_defs, EntityParser};
use crate::rules::BuildRules;
use crate::tags::{TagCode, TagType, TagValue};
use crate::xml::{parse_document, write_document, XmlNode};
use std::collections::BTreeMap;

/// Build the canonical tree of a corpus
pub fn corpus_to_xml(corpus: &Corpus) -> XmlNode {
    let mut root = XmlNode::new("CardDefs").with_attr("build", corpus.build.to_string());
    for entity in corpus.sorted() {
        root.push(entity_to_xml(entity));
    }
    root
}

/// Serialize a corpus as a canonical XML document
pub fn write_corpus(corpus: &Corpus) -> Result<String> {
    write_document(&corpus_to_xml(corpus))
}

/// Read a canonical document back into a corpus
pub fn read_corpus(content: &str, name: &str, locales: &LocaleConfig) -> Result<Corpus> {
    let root = parse_document(content, name)?;
    if root.name != "CardDefs" {
        return Err(Error::UnknownElement {
            element: root.name,
            parent: "document".to_string(),
            context: name.to_string(),
        });
    }

    let build = root
        .attr("build")
        .ok_or_else(|| Error::MissingAttribute {
            attribute: "build".to_string(),
            element: root.name.clone(),
            context: name.to_string(),
        })?;
    let build: u32 = build.trim().parse().map_err(|_| Error::InvalidValue {
        value: build.to_string(),
        what: "build".to_string(),
        context: name.to_string(),
    })?;

    let parser = EntityParser {
        document: name,
        default_locale: &locales.primary,
        allow_derived: true,
    };
    let raw = RawCorpus {
        build,
        shape: RawShape::Consolidated,
        documents: vec![RawDocument {
            name: name.to_string(),
            locale: None,
            entities: parse_card_defs(&root, &parser)?,
        }],
    };

    // Warnings have already been logged
    Ok(merge_locales(raw, &BuildRules::for_build(build), locales).value)
}

fn entity_to_xml(entity: &Entity) -> XmlNode {
    let mut node = XmlNode::new("Entity").with_attr("CardID", entity.id.as_str());
    if let Some(dbf_id) = entity.dbf_id {
        node = node.with_attr("ID", dbf_id.to_string());
    }
    node = node.with_attr("version", entity.version.to_string());

    if let Some(master_power) = &entity.master_power {
        node.push(XmlNode::new("MasterPower").with_text(master_power.as_str()));
    }

    let mut tags: BTreeMap<TagCode, XmlNode> = BTreeMap::new();
    for (&code, value) in &entity.tags {
        tags.insert(code, scalar_tag(code, value));
    }
    for (&code, bag) in &entity.strings {
        tags.insert(code, string_tag(code, bag));
    }
    for tag in tags.into_values() {
        node.push(tag);
    }

    for (&code, value) in &entity.referenced_tags {
        let tag_type = Some(declared_type(code, value));
        node.push(tag_node("ReferencedTag", code, tag_type).with_attr("value", value.to_attr()));
    }

    for power in &entity.powers {
        let mut power_node =
            XmlNode::new("Power").with_attr("definition", power.definition.as_str());
        for req in &power.requirements {
            let mut req_node =
                XmlNode::new("PlayRequirement").with_attr("reqID", req.req_id.to_string());
            if let Some(param) = &req.param {
                req_node = req_node.with_attr("param", param.as_str());
            }
            power_node.push(req_node);
        }
        node.push(power_node);
    }

    for card_id in &entity.entourage {
        node.push(XmlNode::new("EntourageCard").with_attr("cardID", card_id.as_str()));
    }

    for info in &entity.triggered_power_history {
        node.push(
            XmlNode::new("TriggeredPowerHistoryInfo")
                .with_attr("effectIndex", info.effect_index.as_str())
                .with_attr("showInHistory", if info.show_in_history { "True" } else { "False" }),
        );
    }

    if let Some(hero_power) = &entity.hero_power {
        node.push(XmlNode::new("HeroPower").with_attr("cardID", hero_power.as_str()));
    }
    if let Some(texture) = &entity.texture {
        node.push(XmlNode::new("Texture").with_text(texture.as_str()));
    }

    node
}

fn tag_node(element: &str, code: TagCode, tag_type: Option<TagType>) -> XmlNode {
    let mut node = XmlNode::new(element).with_attr("enumID", code.0.to_string());
    if let Some(name) = code.name() {
        node = node.with_attr("name", name);
    }
    match tag_type {
        Some(tag_type) => node.with_attr("type", tag_type.as_str()),
        None => node,
    }
}

fn scalar_tag(code: TagCode, value: &TagValue) -> XmlNode {
    let node = tag_node("Tag", code, Some(declared_type(code, value)));
    match value {
        TagValue::Str(text) => node.with_text(text.as_str()),
        _ => node.with_attr("value", value.to_attr()),
    }
}

/// Text tags with unknown codes are written untyped; their locale children
/// mark them as text when read back
fn string_tag(code: TagCode, bag: &LocaleBag) -> XmlNode {
    let tag_type = code.tag_type().map(|t| match t.is_text() {
        true => t,
        false => TagType::LocString,
    });
    let mut node = tag_node("Tag", code, tag_type);
    for (locale, text) in bag.iter() {
        node.push(XmlNode::new(locale).with_text(text));
    }
    node
}

/// Declared type when known, otherwise inferred from the value
fn declared_type(code: TagCode, value: &TagValue) -> TagType {
    match (code.tag_type(), value) {
        (_, TagValue::Str(_)) => TagType::String,
        (Some(tag_type), _) if !tag_type.is_text() => tag_type,
        (_, TagValue::Bool(_)) => TagType::Bool,
        _ => TagType::Int,
    }
}
