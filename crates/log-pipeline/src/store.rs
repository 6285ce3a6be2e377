//! 노드 상태 저장소
//!
//! 노드 ID별 [`NodeStatus`]를 보관합니다. 매 사이클 시작 시 [`reset`](NodeStateStore::reset)으로
//! 모든 레코드를 기본값으로 교체하므로 사이클 간에 이어지는 상태는 없습니다.
//!
//! 폴러가 단독 소유하며, 동시에 두 사이클이 같은 저장소를 수정하는 일은 없습니다.

use std::collections::HashMap;

use streamr_monitor_core::types::NodeStatus;

/// 노드 ID → 상태 레코드
#[derive(Debug, Default)]
pub struct NodeStateStore {
    records: HashMap<String, NodeStatus>,
    /// 설정 순서
    order: Vec<String>,
}

impl NodeStateStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 상태를 버리고 주어진 ID마다 기본 레코드를 만듭니다.
    ///
    /// 중복 ID는 한 번만 등록됩니다.
    pub fn reset<I, S>(&mut self, node_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.records.clear();
        self.order.clear();
        for id in node_ids {
            let id = id.as_ref();
            if self.records.contains_key(id) {
                continue;
            }
            self.records.insert(id.to_owned(), NodeStatus::default());
            self.order.push(id.to_owned());
        }
    }

    /// 노드 레코드를 조회합니다.
    pub fn get(&self, node_id: &str) -> Option<&NodeStatus> {
        self.records.get(node_id)
    }

    /// 노드 레코드를 가변 조회합니다.
    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut NodeStatus> {
        self.records.get_mut(node_id)
    }

    /// 설정 순서대로 노드 ID를 반환합니다.
    pub fn node_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 노드 레코드의 복사본을 반환합니다 (발행용).
    pub fn snapshot(&self, node_id: &str) -> Option<NodeStatus> {
        self.records.get(node_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn reset_creates_default_records_in_order() {
        let mut store = NodeStateStore::new();
        store.reset(["1-2", "1-1", "1-2"]);
        assert_eq!(store.node_ids(), ["1-2", "1-1"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("1-1"), Some(&NodeStatus::default()));
    }

    #[test]
    fn reset_erases_previous_cycle() {
        let mut store = NodeStateStore::new();
        store.reset(["1-1"]);
        {
            let status = store.get_mut("1-1").unwrap();
            status.version = Some("v52.0.0".to_owned());
            status.add_tracker("abc");
            status.stake = Some(10);
            status.updated_at = Some(Utc::now());
        }

        store.reset(["1-1"]);
        assert_eq!(store.get("1-1"), Some(&NodeStatus::default()));
    }

    #[test]
    fn reset_drops_removed_nodes() {
        let mut store = NodeStateStore::new();
        store.reset(["1-1", "1-2"]);
        store.reset(["1-2"]);
        assert!(store.get("1-1").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.node_ids(), ["1-2".to_owned()]);
    }

    #[test]
    fn unknown_node_is_none() {
        let mut store = NodeStateStore::new();
        assert!(store.is_empty());
        assert!(store.get_mut("missing").is_none());
        assert!(store.snapshot("missing").is_none());
    }
}
