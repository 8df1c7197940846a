//! Family genealogy: flat node list plus the derived tree

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, Gender, GenealogyCreate, GenealogyNode, GenealogyTreeNode, GenealogyUpdate,
};
use shared::util::{new_id, now_millis};
use shared::validation::{
    MAX_NAME_LEN, MAX_TEXT_LEN, MAX_URL_LEN, non_blank, validate_optional_text,
    validate_required_text,
};

use super::access::AccessEvaluator;
use super::activity::ActivityLedger;
use crate::db::{Store, StoreError};
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct GenealogyService {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
    ledger: ActivityLedger,
}

fn parse_gender(value: &str) -> Result<Gender, AppError> {
    Gender::from_db(value).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidGender, format!("Unknown gender: {value}"))
    })
}

/// Nest a flat node list into a forest.
///
/// Nodes whose parent is missing from the list are treated as roots. Sibling
/// order follows the input order.
pub fn build_tree(nodes: Vec<GenealogyNode>) -> Vec<GenealogyTreeNode> {
    let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut children: HashMap<String, Vec<GenealogyNode>> = HashMap::new();
    let mut roots = Vec::new();

    for node in nodes {
        match node.parent_id.clone() {
            Some(parent) if ids.contains(&parent) && parent != node.id => {
                children.entry(parent).or_default().push(node)
            }
            _ => roots.push(node),
        }
    }

    fn attach(
        node: GenealogyNode,
        children: &mut HashMap<String, Vec<GenealogyNode>>,
    ) -> GenealogyTreeNode {
        let kids = children.remove(&node.id).unwrap_or_default();
        GenealogyTreeNode {
            children: kids.into_iter().map(|c| attach(c, children)).collect(),
            node,
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

impl GenealogyService {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator, ledger: ActivityLedger) -> Self {
        Self {
            store,
            access,
            ledger,
        }
    }

    pub async fn create_genealogy(
        &self,
        actor: &str,
        family_id: &str,
        req: GenealogyCreate,
    ) -> ServiceResult<GenealogyNode> {
        self.access.require_family_admin(actor, family_id).await?;

        validate_required_text(&req.person_name, "person_name", MAX_NAME_LEN)?;
        validate_optional_text(&req.biography, "biography", MAX_TEXT_LEN)?;
        validate_optional_text(&req.achievements, "achievements", MAX_TEXT_LEN)?;
        validate_optional_text(&req.position, "position", MAX_NAME_LEN)?;
        validate_optional_text(&req.avatar_url, "avatar_url", MAX_URL_LEN)?;
        let gender = parse_gender(&req.gender)?;

        let parent_id = non_blank(&req.parent_id).map(str::to_string);
        if let Some(parent_id) = &parent_id {
            self.ensure_parent_in_family(family_id, parent_id).await?;
        }
        let memorial_id = non_blank(&req.memorial_id).map(str::to_string);
        if let Some(memorial_id) = &memorial_id {
            self.ensure_memorial_linked(family_id, memorial_id).await?;
        }

        let now = now_millis();
        let node = GenealogyNode {
            id: new_id(),
            family_id: family_id.to_string(),
            person_name: req.person_name.trim().to_string(),
            generation: req.generation,
            parent_id,
            gender,
            birth_date: req.birth_date,
            death_date: req.death_date,
            biography: req.biography,
            avatar_url: req.avatar_url,
            memorial_id,
            position: req.position,
            achievements: req.achievements,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_genealogy(&node).await {
            Ok(()) => {}
            // Parent deleted between the check and the insert
            Err(StoreError::Referenced(_)) => return Err(ErrorCode::GenealogyParentInvalid.into()),
            Err(e) => return Err(e.into()),
        }

        self.ledger
            .record(
                family_id,
                actor,
                node.memorial_id.as_deref(),
                ActivityType::CreateGenealogy,
                json!({ "genealogy_id": node.id, "person_name": node.person_name }),
            )
            .await;
        Ok(node)
    }

    /// Flat list, ordered by generation then name
    pub async fn list_genealogy(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<Vec<GenealogyNode>> {
        self.access.require_family_member(actor, family_id).await?;
        Ok(self.store.list_genealogy(family_id).await?)
    }

    pub async fn genealogy_tree(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<Vec<GenealogyTreeNode>> {
        let nodes = self.list_genealogy(actor, family_id).await?;
        Ok(build_tree(nodes))
    }

    /// Admin only. An empty `parent_id` detaches the node into a root.
    pub async fn update_genealogy(
        &self,
        actor: &str,
        family_id: &str,
        node_id: &str,
        req: GenealogyUpdate,
    ) -> ServiceResult<GenealogyNode> {
        self.access.require_family_admin(actor, family_id).await?;
        let mut node = self.load_node(family_id, node_id).await?;

        if let Some(name) = &req.person_name {
            validate_required_text(name, "person_name", MAX_NAME_LEN)?;
            node.person_name = name.trim().to_string();
        }
        validate_optional_text(&req.biography, "biography", MAX_TEXT_LEN)?;
        validate_optional_text(&req.achievements, "achievements", MAX_TEXT_LEN)?;
        validate_optional_text(&req.position, "position", MAX_NAME_LEN)?;
        validate_optional_text(&req.avatar_url, "avatar_url", MAX_URL_LEN)?;

        if let Some(generation) = req.generation {
            node.generation = generation;
        }
        if let Some(gender) = &req.gender {
            node.gender = parse_gender(gender)?;
        }
        if req.parent_id.is_some() {
            let parent_id = non_blank(&req.parent_id).map(str::to_string);
            if let Some(parent_id) = &parent_id {
                self.ensure_parent_in_family(family_id, parent_id).await?;
                self.ensure_not_ancestor(&node.id, parent_id).await?;
            }
            node.parent_id = parent_id;
        }
        if req.memorial_id.is_some() {
            let memorial_id = non_blank(&req.memorial_id).map(str::to_string);
            if let Some(memorial_id) = &memorial_id {
                self.ensure_memorial_linked(family_id, memorial_id).await?;
            }
            node.memorial_id = memorial_id;
        }
        if req.birth_date.is_some() {
            node.birth_date = req.birth_date;
        }
        if req.death_date.is_some() {
            node.death_date = req.death_date;
        }
        if req.biography.is_some() {
            node.biography = non_blank(&req.biography).map(str::to_string);
        }
        if req.avatar_url.is_some() {
            node.avatar_url = non_blank(&req.avatar_url).map(str::to_string);
        }
        if req.position.is_some() {
            node.position = non_blank(&req.position).map(str::to_string);
        }
        if req.achievements.is_some() {
            node.achievements = non_blank(&req.achievements).map(str::to_string);
        }
        node.updated_at = now_millis();

        self.store.update_genealogy(&node).await?;
        Ok(node)
    }

    /// Admin only; refused while the node has children
    pub async fn delete_genealogy(
        &self,
        actor: &str,
        family_id: &str,
        node_id: &str,
    ) -> ServiceResult<()> {
        self.access.require_family_admin(actor, family_id).await?;
        let node = self.load_node(family_id, node_id).await?;
        if self.store.has_children(&node.id).await? {
            return Err(ErrorCode::GenealogyHasChildren.into());
        }

        match self.store.delete_genealogy(&node.id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ErrorCode::GenealogyNotFound.into()),
            Err(StoreError::Referenced(_)) => Err(ErrorCode::GenealogyHasChildren.into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_node(&self, family_id: &str, node_id: &str) -> ServiceResult<GenealogyNode> {
        self.store
            .find_genealogy(node_id)
            .await?
            .filter(|n| n.family_id == family_id)
            .ok_or_else(|| ErrorCode::GenealogyNotFound.into())
    }

    async fn ensure_parent_in_family(&self, family_id: &str, parent_id: &str) -> ServiceResult<()> {
        match self.store.find_genealogy(parent_id).await? {
            Some(parent) if parent.family_id == family_id => Ok(()),
            _ => Err(ErrorCode::GenealogyParentInvalid.into()),
        }
    }

    async fn ensure_memorial_linked(&self, family_id: &str, memorial_id: &str) -> ServiceResult<()> {
        if !self.store.is_memorial_linked(family_id, memorial_id).await? {
            return Err(ErrorCode::MemorialNotLinked.into());
        }
        Ok(())
    }

    /// Walk up from the proposed parent; meeting `node_id` means a cycle
    async fn ensure_not_ancestor(&self, node_id: &str, new_parent: &str) -> ServiceResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(new_parent.to_string());
        while let Some(id) = cursor {
            if id == node_id {
                return Err(ErrorCode::GenealogyCycle.into());
            }
            if !seen.insert(id.clone()) {
                break;
            }
            cursor = self
                .store
                .find_genealogy(&id)
                .await?
                .and_then(|n| n.parent_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>, generation: i32) -> GenealogyNode {
        GenealogyNode {
            id: id.to_string(),
            family_id: "f1".to_string(),
            person_name: id.to_uppercase(),
            generation,
            parent_id: parent.map(str::to_string),
            gender: Gender::Male,
            birth_date: None,
            death_date: None,
            biography: None,
            avatar_url: None,
            memorial_id: None,
            position: None,
            achievements: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn tree_nests_children_under_parents() {
        let tree = build_tree(vec![
            node("root", None, 1),
            node("a", Some("root"), 2),
            node("b", Some("root"), 2),
            node("a1", Some("a"), 3),
        ]);
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.node.id, "root");
        let kids: Vec<_> = root.children.iter().map(|c| c.node.id.as_str()).collect();
        assert_eq!(kids, vec!["a", "b"]);
        assert_eq!(root.children[0].children[0].node.id, "a1");
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn orphans_become_roots() {
        let tree = build_tree(vec![node("x", Some("missing"), 2), node("y", None, 1)]);
        let roots: Vec<_> = tree.iter().map(|t| t.node.id.as_str()).collect();
        assert_eq!(roots, vec!["x", "y"]);
    }

    #[test]
    fn child_listed_before_parent_is_still_nested() {
        let tree = build_tree(vec![node("kid", Some("dad"), 2), node("dad", None, 1)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].node.id, "kid");
    }

    #[test]
    fn empty_list_gives_empty_forest() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn gender_is_validated() {
        assert_eq!(parse_gender("female").unwrap(), Gender::Female);
        assert_eq!(parse_gender("other").unwrap_err().code, ErrorCode::InvalidGender);
    }
}
