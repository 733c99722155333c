mod ingress;
mod plugin;
mod presence;
