use super::QueryDef;

pub const POLICIES: QueryDef = QueryDef {
    name: "policies",
    sql: r#"
        SELECT schemaname, tablename, policyname,
               permissive = 'PERMISSIVE' AS permissive,
               roles, cmd, qual, with_check
        FROM pg_policies
        WHERE tablename = ANY($1::text[])
        ORDER BY tablename, schemaname, policyname
    "#,
    columns: &[
        "schemaname",
        "tablename",
        "policyname",
        "permissive",
        "roles",
        "cmd",
        "qual",
        "with_check",
    ],
};

pub const INDEXES: QueryDef = QueryDef {
    name: "indexes",
    sql: r#"
        SELECT tablename, indexname, indexdef
        FROM pg_indexes
        WHERE tablename = ANY($1::text[])
        ORDER BY tablename, indexname
    "#,
    columns: &["tablename", "indexname", "indexdef"],
};

// Internal triggers back foreign keys and are excluded.
pub const TRIGGERS: QueryDef = QueryDef {
    name: "triggers",
    sql: r#"
        SELECT c.relname AS table_name,
               t.tgname AS trigger_name,
               pg_get_triggerdef(t.oid) AS definition
        FROM pg_trigger t
        JOIN pg_class c ON c.oid = t.tgrelid
        WHERE NOT t.tgisinternal
          AND c.relname = ANY($1::text[])
        ORDER BY c.relname, t.tgname
    "#,
    columns: &["table_name", "trigger_name", "definition"],
};

/// Run order is output order.
pub const INTROSPECTION_QUERIES: [QueryDef; 3] = [POLICIES, INDEXES, TRIGGERS];
