use std::path::PathBuf;

use tracing::trace;

use super::desktop_file::{self, IconLookup};
use super::index::DesktopFileIndex;
use crate::common::collections::HashMap;
use crate::model::entry::{AppEntry, WindowInstance};

/// Lowercases and strips everything but alphanumerics, so that
/// "Some-Weird_App Name" and "someweirdappname" compare equal.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// All windows sharing one window class within a resolution pass.
#[derive(Debug, Clone)]
pub struct ClassGroup {
    pub class: String,
    pub instances: Vec<WindowInstance>,
}

/// One step of the descriptor cascade. Rules are pure: given a group and the
/// corpus they either yield a descriptor path or pass. The first rule that
/// matches wins.
pub trait ResolveRule {
    fn name(&self) -> &'static str;
    fn apply(&self, group: &ClassGroup, index: &DesktopFileIndex) -> Option<PathBuf>;
}

/// `<class>.desktop` (then its lowercase form) checked against each search
/// directory in priority order.
struct ExactNameRule;

impl ResolveRule for ExactNameRule {
    fn name(&self) -> &'static str { "exact-name" }

    fn apply(&self, group: &ClassGroup, index: &DesktopFileIndex) -> Option<PathBuf> {
        for dir in index.search_paths() {
            let candidate = dir.join(format!("{}.desktop", group.class));
            if candidate.exists() {
                return Some(candidate);
            }
            let lowercase = dir.join(format!("{}.desktop", group.class.to_lowercase()));
            if lowercase.exists() {
                return Some(lowercase);
            }
        }
        None
    }
}

/// First corpus file whose normalized stem contains the normalized class.
struct ClassSubstringRule;

impl ResolveRule for ClassSubstringRule {
    fn name(&self) -> &'static str { "class-substring" }

    fn apply(&self, group: &ClassGroup, index: &DesktopFileIndex) -> Option<PathBuf> {
        let class = normalize(&group.class);
        index
            .corpus()
            .iter()
            .find(|file| stem_contains(file, &class))
            .cloned()
    }
}

/// Last resort: corpus files whose normalized stem contains the first word
/// of the window title; among the candidates the longest filename wins.
struct TitleWordRule;

impl ResolveRule for TitleWordRule {
    fn name(&self) -> &'static str { "title-word" }

    fn apply(&self, group: &ClassGroup, index: &DesktopFileIndex) -> Option<PathBuf> {
        let title = &group.instances.first()?.title;
        let word = normalize(title.split_whitespace().next()?);
        if word.is_empty() {
            return None;
        }

        let mut best: Option<&PathBuf> = None;
        for file in index.corpus().iter().filter(|f| stem_contains(f, &word)) {
            let longer = best.is_none_or(|b| path_len(file) > path_len(b));
            if longer {
                best = Some(file);
            }
        }
        best.cloned()
    }
}

fn stem_contains(file: &PathBuf, needle: &str) -> bool {
    let Some(stem) = file.file_stem() else {
        return false;
    };
    normalize(&stem.to_string_lossy()).contains(needle)
}

fn path_len(path: &PathBuf) -> usize { path.as_os_str().len() }

/// Which monitors a resolution pass considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorFilter {
    All,
    Only(i32),
}

/// Groups the current window instances by class and resolves each group to
/// a descriptor through the rule cascade.
pub struct ResolutionEngine {
    index: DesktopFileIndex,
    theme: Box<dyn IconLookup + Send>,
    rules: Vec<Box<dyn ResolveRule + Send>>,
}

impl ResolutionEngine {
    pub fn new(index: DesktopFileIndex, theme: Box<dyn IconLookup + Send>) -> ResolutionEngine {
        ResolutionEngine {
            index,
            theme,
            rules: vec![
                Box::new(ExactNameRule),
                Box::new(ClassSubstringRule),
                Box::new(TitleWordRule),
            ],
        }
    }

    pub fn index(&self) -> &DesktopFileIndex { &self.index }

    /// Produces one entry per window class, in first-seen order of the
    /// snapshot so an unchanged window list resolves to an identically
    /// ordered entry list.
    pub fn resolve(&self, instances: &[WindowInstance], filter: MonitorFilter) -> Vec<AppEntry> {
        group_by_class(instances, filter)
            .into_iter()
            .map(|group| self.resolve_group(group))
            .collect()
    }

    fn resolve_group(&self, group: ClassGroup) -> AppEntry {
        let mut descriptor = None;
        for rule in &self.rules {
            if let Some(path) = rule.apply(&group, &self.index) {
                trace!(
                    rule = rule.name(),
                    class = %group.class,
                    path = %path.display(),
                    "descriptor resolved"
                );
                descriptor = Some(path);
                break;
            }
        }

        let record = descriptor
            .as_deref()
            .map(desktop_file::parse)
            .unwrap_or_default();

        AppEntry {
            instance_count: group.instances.len(),
            pinned: false,
            name: record.name,
            exec: record.exec,
            icon_path: desktop_file::find_icon(&record.icon, self.theme.as_ref()),
            desktop_file: descriptor
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            instances: group.instances,
        }
    }
}

fn group_by_class(instances: &[WindowInstance], filter: MonitorFilter) -> Vec<ClassGroup> {
    let mut groups: Vec<ClassGroup> = Vec::new();
    let mut by_class: HashMap<String, usize> = HashMap::default();

    for instance in instances {
        if let MonitorFilter::Only(monitor) = filter {
            if instance.monitor != monitor {
                continue;
            }
        }
        let idx = *by_class.entry(instance.class.clone()).or_insert_with(|| {
            groups.push(ClassGroup {
                class: instance.class.clone(),
                instances: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].instances.push(instance.clone());
    }

    groups
}
