//! 活用語尾のエッジ圧縮トライ
//!
//! 各エッジには活用語尾の部分文字列がラベル付けされ、根からノードまでの
//! ラベルを連結すると活用形が読み取れます。兄弟エッジが先頭文字を
//! 共有することはありません。

use std::sync::Arc;

use super::{Conjugation, ConjugationRegistry};
use crate::errors::Result;

/// トライのノード
///
/// エッジラベル、このノードまでのパスが表す活用形に付属する活用のリスト、
/// および子ノードの配列を所有します。
struct TrieNode {
    /// エッジラベル。ある活用語尾の部分文字列。
    edge: String,
    /// このノードに付属する活用。パスが活用形を表さない、単なる分岐点の
    /// ノードでは空になります。
    conjugations: Vec<Arc<Conjugation>>,
    /// 子ノード。根からこのノードまでのラベルは、すべての子孫の活用形の
    /// 接頭辞です。
    children: Vec<TrieNode>,
}

impl TrieNode {
    fn leaf(edge: &str, conjugation: Arc<Conjugation>) -> Self {
        Self {
            edge: edge.to_string(),
            conjugations: vec![conjugation],
            children: Vec::new(),
        }
    }
}

/// 活用語尾から辞書形への対応を保持するエッジ圧縮トライ
///
/// [`add_conjugation`](Self::add_conjugation)で1行ずつ構築し、
/// すべての挿入が終わった後に
/// [`propagate_conjugations`](Self::propagate_conjugations)を1回実行してから
/// 検索に使用します。リソースからの構築には
/// [`from_reader`](Self::from_reader)を使用してください。
pub struct ConjugationTrie {
    root: TrieNode,
    rows: usize,
}

impl ConjugationTrie {
    /// 空のトライを生成します。
    ///
    /// 空のトライに対する検索は常に一致なしを報告します。
    pub fn empty() -> Self {
        Self {
            root: TrieNode {
                edge: String::new(),
                conjugations: Vec::new(),
                children: Vec::new(),
            },
            rows: 0,
        }
    }

    /// リソースを読み込んでトライを構築します。
    ///
    /// リソースのフォーマットは2つのセクションからなるテキストです。
    /// `$`で始まる行がセクションの区切りで、`#`で始まる行はコメントです。
    /// セクション1の各行は`略号<TAB>種別の説明`、セクション2の各行は
    /// `活用語尾<TAB>辞書形語尾<TAB>略号`です。
    ///
    /// 構築後、[`propagate_conjugations`](Self::propagate_conjugations)は
    /// 実行済みです。
    ///
    /// # エラー
    ///
    /// リソースの読み込みに失敗した場合、I/Oエラーを返します。
    pub fn from_reader<R: std::io::Read>(
        reader: R,
        registry: &ConjugationRegistry,
    ) -> Result<Self> {
        super::resource::parse_resource(reader, registry)
    }

    /// トライが空(活用が1つも登録されていない)かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// 登録された活用行の数を返します。
    pub fn len(&self) -> usize {
        self.rows
    }

    /// 1つの活用定義をトライへ追加します。
    ///
    /// 三つ組は`registry`経由でインターンされます。同じ活用形を持つ別の
    /// 活用(同形語)は同じノードに並びます。
    ///
    /// # 引数
    ///
    /// * `conjugated_form` - 活用した語尾
    /// * `dictionary_form` - 辞書形の語尾
    /// * `grammatical_type` - 文法種別の説明
    /// * `registry` - インターンに使用するレジストリ
    pub fn add_conjugation(
        &mut self,
        conjugated_form: &str,
        dictionary_form: &str,
        grammatical_type: &str,
        registry: &ConjugationRegistry,
    ) {
        let conjugation = registry.intern(conjugated_form, dictionary_form, grammatical_type);
        insert(&mut self.root, conjugated_form, conjugation);
        self.rows += 1;
    }

    /// 先祖の活用を子孫へ伝播させます。
    ///
    /// すべての挿入が終わった後に1回実行します。実行後、各ノードのリストは
    /// 自身の活用の後に、辞書形が自身の活用と重複しない先祖の活用を
    /// 最長一致順に並べたものになります。近いノードの活用が、同じ辞書形を
    /// 持つ遠い先祖の活用を隠します。
    pub fn propagate_conjugations(&mut self) {
        propagate(&mut self.root, &[]);
    }

    /// 入力文字列の先頭に一致する活用形を検索します。
    ///
    /// 根から貪欲に最長一致で降下し、活用リストを持つノードを通過するたびに
    /// それを記憶します。これ以上降下できなくなった時点で、最後に記憶した
    /// リストを返します。伝播によって短い代替一致は各ノードに事前計算されて
    /// いるため、後戻りは不要です。
    ///
    /// # 戻り値
    ///
    /// 最長一致した語尾の活用リスト。根からの一致がなければ`None`。
    pub fn find_conjugations(&self, text: &str) -> Option<&[Arc<Conjugation>]> {
        let mut node = &self.root;
        let mut rest = text;
        let mut best: Option<&[Arc<Conjugation>]> = None;

        'descend: loop {
            for child in &node.children {
                if rest.starts_with(child.edge.as_str()) {
                    rest = &rest[child.edge.len()..];
                    node = child;
                    if !child.conjugations.is_empty() {
                        best = Some(child.conjugations.as_slice());
                    }
                    continue 'descend;
                }
            }
            break;
        }

        best
    }
}

/// `suffix`をノードの子として挿入します。
fn insert(node: &mut TrieNode, suffix: &str, conjugation: Arc<Conjugation>) {
    let Some(first) = suffix.chars().next() else {
        // an empty ending attaches to the node itself
        node.conjugations.push(conjugation);
        return;
    };

    let matching = node
        .children
        .iter()
        .position(|child| child.edge.chars().next() == Some(first));
    let Some(position) = matching else {
        node.children.push(TrieNode::leaf(suffix, conjugation));
        return;
    };

    let child = &mut node.children[position];
    let common = common_prefix_len(&child.edge, suffix);

    if common == child.edge.len() {
        if common == suffix.len() {
            // identical conjugated forms share one node
            child.conjugations.push(conjugation);
        } else {
            insert(child, &suffix[common..], conjugation);
        }
        return;
    }

    // the edge and the new suffix diverge inside the edge: split it
    let mut old = std::mem::replace(
        child,
        TrieNode {
            edge: suffix[..common].to_string(),
            conjugations: Vec::new(),
            children: Vec::new(),
        },
    );
    let tail = old.edge.split_off(common);
    old.edge = tail;

    if common == suffix.len() {
        // the new conjugation sits on the split point itself
        child.conjugations.push(conjugation);
        child.children.push(old);
    } else {
        child.children.push(TrieNode::leaf(&suffix[common..], conjugation));
        child.children.push(old);
    }
}

/// 2つの文字列の共通接頭辞のバイト長を文字境界に沿って返します。
fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    let mut a_chars = a.chars();
    let mut b_chars = b.chars();
    loop {
        match (a_chars.next(), b_chars.next()) {
            (Some(x), Some(y)) if x == y => len += x.len_utf8(),
            _ => return len,
        }
    }
}

/// 先祖から受け継いだ活用リストを深さ優先で配布します。
fn propagate(node: &mut TrieNode, inherited: &[Arc<Conjugation>]) {
    if node.conjugations.is_empty() {
        for child in &mut node.children {
            propagate(child, inherited);
        }
        return;
    }

    let own = node.conjugations.len();
    for conjugation in inherited {
        // an inherited conjugation is shadowed by an own entry
        // with the same dictionary form
        let shadowed = node.conjugations[..own]
            .iter()
            .any(|c| c.dictionary_form() == conjugation.dictionary_form());
        if !shadowed {
            node.conjugations.push(Arc::clone(conjugation));
        }
    }

    let list = node.conjugations.clone();
    for child in &mut node.children {
        propagate(child, &list);
    }
}
