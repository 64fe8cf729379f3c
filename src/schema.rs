diesel::table! {
    projects (uuid) {
        uuid -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    experiments (uuid) {
        uuid -> Uuid,
        name -> Text,
        project_id -> Uuid,
        pipeline_id_train -> Nullable<Text>,
        pipeline_id_deploy -> Nullable<Text>,
        dataset_id -> Nullable<Text>,
        header_id -> Nullable<Text>,
        target_column_id -> Nullable<Text>,
        parameters -> Nullable<Jsonb>,
        run_id -> Nullable<Text>,
        run_status -> Nullable<Text>,
        template -> Nullable<Text>,
        created_at -> Timestamptz,
        position -> Nullable<Int4>,
    }
}

diesel::table! {
    experiment_components (uuid) {
        uuid -> Uuid,
        experiment_id -> Uuid,
        component_id -> Uuid,
        created_at -> Timestamptz,
        position -> Nullable<Int4>,
    }
}

diesel::table! {
    components (uuid) {
        uuid -> Uuid,
        name -> Text,
        parameters -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(experiments -> projects (project_id));
diesel::joinable!(experiment_components -> experiments (experiment_id));
diesel::joinable!(experiment_components -> components (component_id));

diesel::allow_tables_to_appear_in_same_query!(
    projects,
    experiments,
    experiment_components,
    components,
);
