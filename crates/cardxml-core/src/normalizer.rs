//! Raw document shape detection and normalization
//!
//! Raw card definitions arrive either as one `CardDefs` document per locale,
//! as a single `CardDefs` document whose string tags carry one child element
//! per locale, or as per-entity `Entity` documents pulled out of bundles.
//! All of them normalize into a [`RawCorpus`] whose string tags are lists of
//! `(locale, text)` fragments.
//!
//! The set of element kinds inside an entity is closed. Anything else means
//! the format changed underneath us and aborts the run.

use crate::entity::{
    PlayRequirement, Power, RawCorpus, RawDocument, RawEntity, RawShape, TriggeredPowerHistory,
};
use crate::error::{Error, Result};
use crate::locale::LocaleConfig;
use crate::rules::BuildRules;
use crate::tags::{TagCode, TagType, TagValue};
use crate::xml::XmlNode;
use std::str::FromStr;

/// A parsed raw document and the name it was supplied under
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Locale code for per-locale documents, asset or file name otherwise
    pub name: String,
    pub root: XmlNode,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, root: XmlNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

/// Detect the raw shape and normalize every document
pub fn normalize(
    documents: Vec<SourceDocument>,
    rules: &BuildRules,
    locales: &LocaleConfig,
) -> Result<RawCorpus> {
    for doc in &documents {
        if doc.root.name != "CardDefs" && doc.root.name != "Entity" {
            return Err(Error::UnknownElement {
                element: doc.root.name.clone(),
                parent: "document".to_string(),
                context: doc.name.clone(),
            });
        }
    }

    let entity_docs = documents.iter().filter(|d| d.root.name == "Entity").count();
    if entity_docs > 0 && entity_docs != documents.len() {
        return Err(Error::MixedDocuments);
    }

    let shape = if entity_docs > 0 {
        RawShape::Consolidated
    } else if documents.len() > 1 {
        RawShape::PerLocale
    } else if documents.iter().any(|d| has_locale_structure(&d.root)) {
        RawShape::Consolidated
    } else if rules.is_localized() && documents.iter().all(|d| locales.is_known(&d.name)) {
        RawShape::PerLocale
    } else {
        // Pre-localization data: all text belongs to the primary locale
        RawShape::Consolidated
    };

    let mut normalized = Vec::with_capacity(documents.len());
    for doc in &documents {
        let locale = match shape {
            RawShape::PerLocale => Some(doc.name.clone()),
            RawShape::Consolidated => None,
        };
        let parser = EntityParser {
            document: &doc.name,
            default_locale: locale.as_deref().unwrap_or(&locales.primary),
            allow_derived: false,
        };

        let entities = if doc.root.name == "Entity" {
            vec![parser.parse(&doc.root)?]
        } else {
            parse_card_defs(&doc.root, &parser)?
        };

        normalized.push(RawDocument {
            name: doc.name.clone(),
            locale,
            entities,
        });
    }

    tracing::info!(
        "normalized {} document(s) as {:?} for build {}",
        normalized.len(),
        shape,
        rules.build
    );

    Ok(RawCorpus {
        build: rules.build,
        shape,
        documents: normalized,
    })
}

/// Whether any string tag in the document has per-locale children
fn has_locale_structure(root: &XmlNode) -> bool {
    let entities: Vec<&XmlNode> = if root.name == "Entity" {
        vec![root]
    } else {
        root.children_named("Entity").collect()
    };

    entities.iter().any(|entity| {
        entity.children_named("Tag").any(|tag| {
            tag.attr("type").is_some_and(TagType::is_text_attr) && !tag.children.is_empty()
        })
    })
}

pub(crate) fn parse_card_defs(root: &XmlNode, parser: &EntityParser<'_>) -> Result<Vec<RawEntity>> {
    let mut entities = Vec::with_capacity(root.children.len());
    for child in &root.children {
        if child.name != "Entity" {
            return Err(Error::UnknownElement {
                element: child.name.clone(),
                parent: root.name.clone(),
                context: parser.document.to_string(),
            });
        }
        entities.push(parser.parse(child)?);
    }
    Ok(entities)
}

/// Reads `Entity` elements of one document
pub(crate) struct EntityParser<'a> {
    /// Document name, for error context
    pub document: &'a str,
    /// Locale of string tags without per-locale children
    pub default_locale: &'a str,
    /// Accept the `HeroPower` and `Texture` children of canonical documents
    pub allow_derived: bool,
}

impl EntityParser<'_> {
    pub(crate) fn parse(&self, node: &XmlNode) -> Result<RawEntity> {
        let id = required(node, "CardID", self.document)?.to_string();
        let context = format!("{} in {}", id, self.document);

        let mut entity = RawEntity {
            dbf_id: node
                .attr("ID")
                .map(|v| parse_number(v, "ID", &context))
                .transpose()?,
            version: parse_number(required(node, "version", &context)?, "version", &context)?,
            id,
            ..RawEntity::default()
        };

        for child in &node.children {
            match child.name.as_str() {
                "Tag" => self.read_tag(&mut entity, child, &context)?,
                "ReferencedTag" => {
                    let code = tag_code(child, &context)?;
                    let value =
                        parse_number(required(child, "value", &context)?, "value", &context)?;
                    entity
                        .referenced_tags
                        .insert(code, TagValue::from_raw(code, value));
                }
                "MasterPower" => entity.master_power = Some(child.text.trim().to_string()),
                "Power" => entity.powers.push(read_power(child, &context)?),
                "EntourageCard" => {
                    only_attributes(child, &["cardID"], &context)?;
                    let card_id = required(child, "cardID", &context)?;
                    if card_id.is_empty() {
                        return Err(missing(child, "cardID", &context));
                    }
                    entity.entourage.push(card_id.to_string());
                }
                "TriggeredPowerHistoryInfo" => {
                    only_attributes(child, &["effectIndex", "showInHistory"], &context)?;
                    let effect_index = required(child, "effectIndex", &context)?.to_string();
                    let show_in_history = match required(child, "showInHistory", &context)? {
                        "True" => true,
                        "False" => false,
                        other => {
                            return Err(Error::InvalidValue {
                                value: other.to_string(),
                                what: "showInHistory".to_string(),
                                context,
                            })
                        }
                    };
                    entity.triggered_power_history.push(TriggeredPowerHistory {
                        effect_index,
                        show_in_history,
                    });
                }
                "HeroPower" if self.allow_derived => {
                    entity.hero_power = Some(required(child, "cardID", &context)?.to_string());
                }
                "Texture" if self.allow_derived => {
                    entity.texture = Some(child.text.trim().to_string());
                }
                other => {
                    return Err(Error::UnknownElement {
                        element: other.to_string(),
                        parent: node.name.clone(),
                        context,
                    })
                }
            }
        }

        Ok(entity)
    }

    fn read_tag(&self, entity: &mut RawEntity, node: &XmlNode, context: &str) -> Result<()> {
        let code = tag_code(node, context)?;
        let is_text = match node.attr("type") {
            Some(declared) => TagType::is_text_attr(declared),
            None => match code.tag_type() {
                Some(tag_type) => tag_type.is_text(),
                // Canonical output leaves unknown text tags untyped
                None if self.allow_derived && !node.children.is_empty() => true,
                None => return Err(missing(node, "type", context)),
            },
        };

        if !is_text {
            let value = parse_number(required(node, "value", context)?, "value", context)?;
            entity.tags.insert(code, TagValue::from_raw(code, value));
            return Ok(());
        }

        let fragments = entity.strings.entry(code).or_default();
        if node.children.is_empty() {
            fragments.push((self.default_locale.to_string(), node.text.clone()));
        } else {
            for locale in &node.children {
                fragments.push((locale.name.clone(), locale.text.clone()));
            }
        }
        Ok(())
    }
}

fn read_power(node: &XmlNode, context: &str) -> Result<Power> {
    let definition = required(node, "definition", context)?.to_string();
    let mut requirements = Vec::new();
    for child in &node.children {
        if child.name != "PlayRequirement" {
            return Err(Error::UnknownElement {
                element: child.name.clone(),
                parent: node.name.clone(),
                context: context.to_string(),
            });
        }
        requirements.push(PlayRequirement {
            req_id: parse_number(required(child, "reqID", context)?, "reqID", context)?,
            param: child.attr("param").filter(|p| !p.is_empty()).map(str::to_string),
        });
    }
    Ok(Power {
        definition,
        requirements,
    })
}

fn tag_code(node: &XmlNode, context: &str) -> Result<TagCode> {
    parse_number(required(node, "enumID", context)?, "enumID", context).map(TagCode)
}

fn required<'a>(node: &'a XmlNode, attribute: &str, context: &str) -> Result<&'a str> {
    node.attr(attribute).ok_or_else(|| missing(node, attribute, context))
}

fn missing(node: &XmlNode, attribute: &str, context: &str) -> Error {
    Error::MissingAttribute {
        attribute: attribute.to_string(),
        element: node.name.clone(),
        context: context.to_string(),
    }
}

fn only_attributes(node: &XmlNode, allowed: &[&str], context: &str) -> Result<()> {
    match node.attributes.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
        Some((key, _)) => Err(Error::UnexpectedAttribute {
            attribute: key.clone(),
            element: node.name.clone(),
            context: context.to_string(),
        }),
        None => Ok(()),
    }
}

fn parse_number<T: FromStr>(value: &str, what: &str, context: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidValue {
        value: value.to_string(),
        what: what.to_string(),
        context: context.to_string(),
    })
}
