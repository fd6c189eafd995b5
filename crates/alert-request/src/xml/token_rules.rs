use super::escape_nested;
use crate::lookup::{self, Database};
use crate::spec::TokenRule;
use crate::{Error, Result};

const HEADER: &str = "&lt;?xml version='1.0' encoding='UTF-8'?&gt;\
&lt;CVGui_AlertTokenRuleGroup groupOperator=&quot;0&quot;&gt;\
&lt;rules groupOperator=&quot;0&quot;&gt;&lt;rules groupOperator=&quot;2&quot;&gt;&lt;";

// Closes a rule which is followed by another rule.
const CHAINED_CLOSE: &str = " /&gt;&lt;/rules&gt;&lt;rules groupOperator=&quot;2&quot;&gt;&lt;";
// Closes the final rule, and the document.
const TERMINAL_CLOSE: &str = " /&gt;&lt;/rules&gt;&lt;/rules&gt;&lt;/CVGui_AlertTokenRuleGroup&gt;";

/// A token rule with its token attributes resolved from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTokenRule {
    pub rule: String,
    pub token_id: u64,
    pub token_type: i64,
    pub token_format: i64,
    pub value: String,
    pub operator: u32,
}

/// Render resolved token rules as the escaped `CVGui_AlertTokenRuleGroup`
/// document which is embedded in the `alertTokenRuleGroupXml` attribute.
pub fn render_token_rules(rules: &[ResolvedTokenRule]) -> String {
    if rules.is_empty() {
        return String::new();
    }
    let mut out = String::from(HEADER);

    for (index, r) in rules.iter().enumerate() {
        out.push_str(&format!(
            "alertTokenRule tokenMessage=&quot;{}&quot; tokenId=&quot;{}&quot; \
             tokenType=&quot;{}&quot; tokenFormat=&quot;{}&quot; value=&quot;{}&quot; \
             tokenOperator=&quot;{}&quot;",
            escape_nested(&r.rule),
            r.token_id,
            r.token_type,
            r.token_format,
            escape_nested(&r.value),
            r.operator,
        ));
        out.push_str(if index + 1 == rules.len() {
            TERMINAL_CLOSE
        } else {
            CHAINED_CLOSE
        });
    }
    out
}

/// Resolve and render token rules. An empty list renders as an empty string.
pub async fn build_token_rule_fragment<D: Database + ?Sized>(
    db: &D,
    rules: &[TokenRule],
) -> Result<String> {
    let mut resolved = Vec::with_capacity(rules.len());

    for TokenRule {
        rule,
        value,
        operator,
    } in rules
    {
        let lookup_err = |source| Error::Lookup {
            what: format!("token rule '{rule}'"),
            source,
        };
        let Some(token_id) = lookup::token_id(db, rule).await.map_err(lookup_err)? else {
            return Err(Error::AmbiguousToken(rule.clone()));
        };
        let attrs = lookup::token_type_format(db, token_id)
            .await
            .map_err(lookup_err)?;

        resolved.push(ResolvedTokenRule {
            rule: rule.clone(),
            token_id,
            token_type: attrs.token_type,
            token_format: attrs.token_format,
            value: value.clone(),
            operator: *operator,
        });
    }

    Ok(render_token_rules(&resolved))
}
