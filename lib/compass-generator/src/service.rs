//! Maps a normalized component onto an EventCatalog service.

use eventcatalog::{
    Attachment, Badge, Repository, Service, Specification, SpecificationType, Styles,
};
use url::Url;

use crate::component::{last_segment, ComponentConfig, Lifecycle, LinkType, TypeId};
use crate::dependencies::ResolvedDependency;
use crate::errors::GeneratorResult;
use crate::markdown::{sentence_case, DefaultTemplate, MarkdownTemplate, StructuredLinks};
use crate::sanitize::{sanitize_id, sanitize_url};

const GRAY: &str = "#6b7280";
const GREEN: &str = "#22c55e";
const AMBER: &str = "#f59e0b";
const RED: &str = "#ef4444";

const DOCUMENTATION_ATTACHMENT: &str = "documentation";

pub struct RenderContext<'a> {
    pub compass_url: &'a str,
    pub service_id: &'a str,
    pub version: &'a str,
    pub dependencies: &'a [ResolvedDependency],
    /// Replaces the default markdown entirely when set.
    pub template: Option<&'a dyn MarkdownTemplate>,
    pub badges: bool,
}

pub fn render(config: &ComponentConfig, context: &RenderContext<'_>) -> GeneratorResult<Service> {
    let links = StructuredLinks::build(config, context.compass_url);
    let template = context.template.unwrap_or(&DefaultTemplate);
    let markdown = template.render(config, context.dependencies, &links)?;

    let badges = if context.badges {
        Some(badges(config)).filter(|b| !b.is_empty())
    } else {
        None
    };

    Ok(Service {
        id: context.service_id.to_string(),
        name: config.name.clone(),
        version: context.version.to_string(),
        summary: config.description.clone().unwrap_or_default(),
        markdown,
        badges,
        repository: repository(config),
        owners: config
            .owner_id
            .as_deref()
            .map(|owner| vec![sanitize_id(last_segment(owner))]),
        specifications: Some(specifications(config)).filter(|s| !s.is_empty()),
        attachments: Some(attachments(config)).filter(|a| !a.is_empty()),
        sends: None,
        styles: config.type_id.and_then(icon).map(|icon| Styles {
            icon: Some(icon.to_string()),
        }),
    })
}

/// Type, lifecycle, tier, labels, then scorecards.
pub fn badges(config: &ComponentConfig) -> Vec<Badge> {
    let mut badges = Vec::new();

    if let Some(type_id) = config.type_id {
        badges.push(Badge::new(type_id.as_ref(), type_color(type_id)));
    }

    if let Some(lifecycle) = config.fields.lifecycle {
        badges.push(Badge::new(lifecycle.as_ref(), lifecycle_color(lifecycle)));
    }

    if let Some(tier) = config.fields.tier {
        if let Some(color) = tier_color(tier) {
            badges.push(Badge::new(format!("Tier {tier}"), color));
        }
    }

    for label in &config.labels {
        badges.push(Badge::new(label.as_str(), GRAY));
    }

    for scorecard in &config.scorecards {
        let percentage = scorecard.percentage();
        let color = match percentage {
            p if p >= 80 => GREEN,
            p if p >= 50 => AMBER,
            _ => RED,
        };
        badges.push(Badge::new(format!("{}: {percentage}%", scorecard.name), color));
    }

    badges
}

fn type_color(type_id: TypeId) -> &'static str {
    match type_id {
        TypeId::Application => "#0ea5e9",
        TypeId::Service => "#6366f1",
        TypeId::Capability => "#14b8a6",
        TypeId::CloudResource => "#0891b2",
        TypeId::DataPipeline => "#f97316",
        TypeId::Library => "#8b5cf6",
        TypeId::MachineLearningModel => "#ec4899",
        TypeId::Other => GRAY,
        TypeId::UiElement => "#84cc16",
        TypeId::Website => "#3b82f6",
    }
}

fn lifecycle_color(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::Active => GREEN,
        Lifecycle::PreRelease => AMBER,
        Lifecycle::Deprecated => RED,
    }
}

fn tier_color(tier: u8) -> Option<&'static str> {
    match tier {
        1 => Some("#1e3a8a"),
        2 => Some("#1d4ed8"),
        3 => Some("#6d28d9"),
        4 => Some("#a78bfa"),
        _ => None,
    }
}

fn icon(type_id: TypeId) -> Option<&'static str> {
    match type_id {
        TypeId::Application => Some("CubeIcon"),
        TypeId::Service => Some("ServerIcon"),
        TypeId::Capability => Some("PuzzlePieceIcon"),
        TypeId::CloudResource => Some("CloudIcon"),
        TypeId::DataPipeline => Some("CircleStackIcon"),
        TypeId::Library => Some("BookOpenIcon"),
        TypeId::MachineLearningModel => Some("CpuChipIcon"),
        TypeId::UiElement => Some("Squares2X2Icon"),
        TypeId::Website => Some("GlobeAltIcon"),
        TypeId::Other => None,
    }
}

fn repository(config: &ComponentConfig) -> Option<Repository> {
    config
        .links_of(&LinkType::Repository)
        .next()
        .map(|link| sanitize_url(&link.url))
        .filter(|url| !url.is_empty())
        .map(|url| Repository { url })
}

fn specifications(config: &ComponentConfig) -> Vec<Specification> {
    config
        .links
        .iter()
        .filter_map(|link| {
            let name = link.name.as_deref()?;
            let lowered = name.to_lowercase();
            let spec_type = if lowered.contains("openapi") || lowered.contains("swagger") {
                SpecificationType::OpenApi
            } else if lowered.contains("asyncapi") {
                SpecificationType::AsyncApi
            } else {
                return None;
            };

            Some(Specification {
                spec_type,
                path: specification_path(&link.url)?,
                name: Some(name.to_string()),
            })
        })
        .collect()
}

/// Remote `http(s)` specs are kept, local ones must be relative and stay inside the catalog.
fn specification_path(url: &str) -> Option<String> {
    if Url::parse(url).is_ok() {
        return Some(sanitize_url(url)).filter(|u| !u.is_empty());
    }

    let absolute = url.starts_with('/') || url.starts_with('\\');
    let traverses = url.split(['/', '\\']).any(|segment| segment == "..");
    if url.trim().is_empty() || absolute || traverses {
        return None;
    }

    Some(url.to_string())
}

fn attachments(config: &ComponentConfig) -> Vec<Attachment> {
    config
        .links_of(&LinkType::Document)
        .filter_map(|link| {
            let url = sanitize_url(&link.url);
            if url.is_empty() {
                return None;
            }
            Some(Attachment {
                url,
                title: link
                    .name
                    .clone()
                    .unwrap_or_else(|| sentence_case(link.link_type.as_str())),
                attachment_type: Some(DOCUMENTATION_ATTACHMENT.to_string()),
            })
        })
        .collect()
}
